use super::*;

#[test]
fn defaults_have_four_builtins() {
    let palette = Palette::new();
    let keys: Vec<_> = palette.categories().iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, ["location", "home", "feature", "character"]);
    assert!(palette.custom_categories().is_empty());
}

#[test]
fn builtin_styles() {
    let palette = Palette::new();
    assert_eq!(palette.style_for("location"), ("#3b82f6", "📍"));
    assert_eq!(palette.style_for("character"), ("#ec4899", "👤"));
}

#[test]
fn unknown_kind_uses_fallback_style() {
    let palette = Palette::new();
    assert_eq!(palette.style_for("dragon_lair"), (FALLBACK_COLOR, FALLBACK_ICON));
    assert_eq!(palette.label_for("dragon_lair"), "Dragon_lair");
}

#[test]
fn normalize_key_strips_and_lowercases() {
    assert_eq!(Palette::normalize_key("  Dragon Lair! "), "dragon_lair");
    assert_eq!(Palette::normalize_key("Ruins-2"), "ruins-2");
    assert_eq!(Palette::normalize_key("???"), "");
}

#[test]
fn add_custom_registers_category() {
    let mut palette = Palette::new();
    let key = palette.add_custom("Dragon Lair", "#ff0000", "🐉").unwrap();
    assert_eq!(key, "dragon_lair");
    assert_eq!(palette.custom_categories().len(), 1);
    assert_eq!(palette.style_for("dragon_lair"), ("#ff0000", "🐉"));
    assert_eq!(palette.label_for("dragon_lair"), "Dragon Lair");
}

#[test]
fn add_custom_rejects_empty_and_duplicate() {
    let mut palette = Palette::new();
    assert!(matches!(palette.add_custom("!!", "#000", "x"), Err(SceneError::InvalidCategory(_))));
    assert!(matches!(palette.add_custom("Home", "#000", "x"), Err(SceneError::DuplicateCategory(_))));
}

#[test]
fn add_custom_blank_icon_uses_fallback() {
    let mut palette = Palette::new();
    palette.add_custom("Camp", "#111", " ").unwrap();
    assert_eq!(palette.style_for("camp").1, FALLBACK_ICON);
}

#[test]
fn restore_custom_replaces_and_skips_builtin_collisions() {
    let mut palette = Palette::new();
    palette.add_custom("Old", "#111", "o").unwrap();
    palette.restore_custom(vec![
        MarkerCategory { key: "camp".into(), label: "Camp".into(), color: "#222".into(), icon: "⛺".into() },
        MarkerCategory { key: "home".into(), label: "Fake".into(), color: "#333".into(), icon: "h".into() },
    ]);
    let custom: Vec<_> = palette.custom_categories().iter().map(|c| c.key.as_str()).collect();
    assert_eq!(custom, ["camp"]);
    assert_eq!(palette.style_for("home").0, "#f59e0b");
}

#[test]
fn visibility_toggles_and_restores() {
    let mut palette = Palette::new();
    palette.set_visible("home", false);
    assert!(!palette.is_visible("home"));
    assert!(!palette.visible_keys().contains(&"home".to_string()));

    palette.restore_visible(&["home".to_string()]);
    assert!(palette.is_visible("home"));
    assert!(!palette.is_visible("location"));

    palette.set_visible("location", true);
    assert!(palette.is_visible("location"));
}

#[test]
fn capitalize_handles_empty_and_unicode() {
    assert_eq!(capitalize(""), "");
    assert_eq!(capitalize("élan"), "Élan");
}
