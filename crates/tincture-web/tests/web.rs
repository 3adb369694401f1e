//! Browser tests. Run with `wasm-pack test --headless --firefox crates/tincture-web`.
#![cfg(target_arch = "wasm32")]

use js_sys::{Function, Object, Reflect};
use tincture::{ThemeError, ThemeManagerConfig, ThemeVariables};
use tincture_web::{attach, JsThemeManager, WebElement, WebHost};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;
use web_sys::Element;

wasm_bindgen_test_configure!(run_in_browser);

fn app_container(id: &str) -> Element {
    let host = WebHost::new().unwrap();
    let document = host.document();
    let element = document.create_element("div").unwrap();
    element.set_id(id);
    document.body().unwrap().append_child(&element).unwrap();
    element
}

fn get(object: &JsValue, key: &str) -> JsValue {
    Reflect::get(object, &JsValue::from_str(key)).unwrap()
}

fn js_manager(selector: &str) -> JsThemeManager {
    let options = Object::new();
    Reflect::set(&options, &"root".into(), &JsValue::from_str(selector)).unwrap();
    Reflect::set(&options, &"disableFollowSystemTheme".into(), &JsValue::TRUE).unwrap();
    JsThemeManager::new(options.into()).unwrap()
}

#[wasm_bindgen_test]
fn test_style_injected_and_toggle_sets_attribute() {
    let container = app_container("app-toggle");
    let themes = attach(ThemeManagerConfig::new().with_selector("#app-toggle")).unwrap();

    let first = container.first_element_child().unwrap();
    assert_eq!(first.tag_name().to_lowercase(), "style");
    assert!(first.has_attribute("data-tincture"));

    themes
        .register("dark", ThemeVariables::new().set("--bg", "#000"))
        .unwrap();
    themes.toggle(Some("dark")).unwrap();
    assert_eq!(container.get_attribute("data-theme").as_deref(), Some("dark"));

    themes.toggle(None).unwrap();
    assert_eq!(container.get_attribute("data-theme"), None);
    themes.destroy();
}

#[wasm_bindgen_test]
fn test_element_root_and_destroy_removes_style() {
    let container = app_container("app-destroy");
    let config = ThemeManagerConfig::new()
        .without_system_theme()
        .with_element(WebElement(container.clone()));
    let themes = attach(config).unwrap();
    themes.register("light", ThemeVariables::new().set("--bg", "#fff")).unwrap();
    themes.toggle(Some("light")).unwrap();
    assert!(themes.css_text().unwrap().contains("[data-theme=\"light\"]"));

    themes.destroy();

    assert!(container.query_selector("style[data-tincture]").unwrap().is_none());
    assert_eq!(container.get_attribute("data-theme"), None);
    assert_eq!(themes.current_theme(), Err(ThemeError::Destroyed));
}

#[wasm_bindgen_test]
fn test_unmatched_selector_is_configuration_error() {
    let result = attach(ThemeManagerConfig::new().with_selector("#no-such-root"));
    assert!(matches!(result, Err(ThemeError::Configuration(_))));
}

#[wasm_bindgen_test]
fn test_js_errors_carry_kind_name() {
    app_container("app-js-errors");
    let themes = js_manager("#app-js-errors");

    let err = themes.toggle(Some("missing".to_string())).unwrap_err();
    assert_eq!(get(&err, "name").as_string().as_deref(), Some("UnknownThemeError"));

    let err = themes.register("x", JsValue::TRUE).unwrap_err();
    assert_eq!(get(&err, "name").as_string().as_deref(), Some("InvalidThemeDataError"));
}

#[wasm_bindgen_test]
fn test_js_calls_after_destroy_throw_destroyed() {
    app_container("app-js-destroy");
    let mut themes = js_manager("#app-js-destroy");
    let callback = Function::new_no_args("");
    themes.on("themeChange", callback.clone()).unwrap();

    themes.destroy();

    let errors = vec![
        themes.off("themeChange", callback.clone()).unwrap_err(),
        themes.on("themeChange", callback).unwrap_err(),
        themes.register("x", JsValue::TRUE).unwrap_err(),
        themes.clone_theme("a", "b", JsValue::TRUE).unwrap_err(),
        themes.update_base_variables(JsValue::TRUE).unwrap_err(),
        themes.clear_listeners(None).unwrap_err(),
    ];
    for err in errors {
        assert_eq!(get(&err, "name").as_string().as_deref(), Some("DestroyedError"));
    }
}

#[wasm_bindgen_test]
fn test_js_status_uses_camel_case_keys() {
    app_container("app-js-status");
    let mut themes = js_manager("#app-js-status");
    themes.register("dark", JsValue::NULL).unwrap();
    themes.toggle(Some("dark".to_string())).unwrap();

    let status = themes.status().unwrap();
    assert_eq!(get(&status, "themeCount").as_f64(), Some(1.0));
    assert_eq!(get(&status, "currentTheme").as_string().as_deref(), Some("dark"));
    assert_eq!(get(&status, "followSystemTheme").as_bool(), Some(false));
    assert!(get(&status, "theme_count").is_undefined());

    themes.destroy();
    assert_eq!(get(&themes.status().unwrap(), "destroyed").as_bool(), Some(true));
}
