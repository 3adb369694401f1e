//! JavaScript-facing `ThemeManager` class.
//!
//! ```js
//! import { ThemeManager } from "tincture-web";
//!
//! const themes = new ThemeManager({ root: "#app", baseVariables: { "--font": "Inter" } });
//! themes.register("light", { "--bg": "#fff" });
//! themes.register("dark", { "--bg": "#000" });
//! themes.on("themeChange", (event) => console.log(event.name, event.data));
//! themes.toggle("dark");
//! ```
//!
//! Errors are thrown as `Error` objects carrying the Rust error message, with
//! `name` set to the error kind (`UnknownThemeError`, `DestroyedError`, ...).

use js_sys::{Array, Function, Object, Reflect};
use tincture::{
    listener, EventKind, Listener, RootTarget, ThemeError, ThemeEvent, ThemeManager,
    ThemeManagerConfig, ThemeVariables, VarValue,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Element;

use crate::host::{describe, WebElement, WebHost};

fn error_name(err: &ThemeError) -> &'static str {
    match err {
        ThemeError::Configuration(_) => "ConfigurationError",
        ThemeError::InvalidThemeName { .. } => "InvalidThemeNameError",
        ThemeError::InvalidThemeData { .. } => "InvalidThemeDataError",
        ThemeError::UnknownTheme(_) => "UnknownThemeError",
        ThemeError::Destroyed => "DestroyedError",
        ThemeError::StyleSheet(_) => "StyleSheetError",
        ThemeError::Parse { .. } => "ParseError",
    }
}

fn to_js_error(err: ThemeError) -> JsValue {
    let error = js_sys::Error::new(&err.to_string());
    error.set_name(error_name(&err));
    error.into()
}

fn get(object: &JsValue, key: &str) -> JsValue {
    Reflect::get(object, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

fn variables_from_js(theme: &str, value: &JsValue) -> Result<ThemeVariables, ThemeError> {
    let invalid = |reason: String| ThemeError::InvalidThemeData {
        theme: theme.to_string(),
        reason,
    };
    if value.is_undefined() || value.is_null() {
        return Ok(ThemeVariables::new());
    }
    if !value.is_object() || Array::is_array(value) {
        return Err(invalid("expected a plain name/value object".to_string()));
    }

    let mut vars = ThemeVariables::new();
    for entry in Object::entries(value.unchecked_ref::<Object>()).iter() {
        let pair: Array = entry.unchecked_into();
        let name = pair.get(0).as_string().unwrap_or_default();
        let raw = pair.get(1);
        let value = if let Some(text) = raw.as_string() {
            VarValue::Text(text)
        } else if let Some(number) = raw.as_f64() {
            VarValue::Number(number)
        } else {
            return Err(invalid(format!(
                "value for '{}' must be a string or number",
                name
            )));
        };
        vars.insert(&name, value);
    }
    Ok(vars)
}

fn variables_to_js(vars: &ThemeVariables) -> JsValue {
    let object = Object::new();
    for (name, value) in vars.iter() {
        let value = match value {
            VarValue::Text(text) => JsValue::from_str(text),
            VarValue::Number(number) => JsValue::from_f64(*number),
        };
        let _ = Reflect::set(&object, &JsValue::from_str(name), &value);
    }
    object.into()
}

fn optional_variables_to_js(vars: Option<&ThemeVariables>) -> JsValue {
    vars.map(variables_to_js).unwrap_or(JsValue::NULL)
}

fn event_to_js(event: &ThemeEvent) -> JsValue {
    let object = Object::new();
    let set = |key: &str, value: &JsValue| {
        let _ = Reflect::set(&object, &JsValue::from_str(key), value);
    };
    set("type", &JsValue::from_str(&event.kind().to_string()));
    match event {
        ThemeEvent::ThemeChange { name, data } => {
            set(
                "name",
                &name.as_deref().map(JsValue::from_str).unwrap_or(JsValue::NULL),
            );
            set("data", &optional_variables_to_js(data.as_ref()));
        }
        ThemeEvent::SystemThemeChange(mode) => set("theme", &JsValue::from_str(mode.as_str())),
        ThemeEvent::ThemeRegister { name, data } => {
            set("name", &JsValue::from_str(name));
            set("data", &variables_to_js(data));
        }
        ThemeEvent::ThemeUnregister { name } => set("name", &JsValue::from_str(name)),
    }
    object.into()
}

fn config_from_js(options: &JsValue) -> Result<ThemeManagerConfig<WebElement>, ThemeError> {
    let mut config = ThemeManagerConfig::new();
    if options.is_undefined() || options.is_null() {
        return Ok(config);
    }

    let root = get(options, "root");
    config.root = if root.is_undefined() || root.is_null() {
        RootTarget::Document
    } else if let Some(selector) = root.as_string() {
        RootTarget::Selector(selector)
    } else {
        match root.dyn_into::<Element>() {
            Ok(element) => RootTarget::Element(WebElement(element)),
            Err(_) => {
                return Err(ThemeError::Configuration(
                    "root must be a selector string or an Element".to_string(),
                ))
            }
        }
    };

    config.base_variables = variables_from_js("base variables", &get(options, "baseVariables"))
        .map_err(|err| ThemeError::Configuration(err.to_string()))?;
    config.disable_follow_system_theme = get(options, "disableFollowSystemTheme")
        .as_bool()
        .unwrap_or(false);

    if let Ok(hook) = get(options, "afterToggle").dyn_into::<Function>() {
        config = config.with_after_toggle(move |name, data| {
            let name = name.map(JsValue::from_str).unwrap_or(JsValue::NULL);
            hook.call2(&JsValue::NULL, &name, &optional_variables_to_js(data))
                .map(|_| ())
                .map_err(|err| anyhow::anyhow!(describe(&err)))
        });
    }
    Ok(config)
}

fn parse_kind(event: &str) -> Result<EventKind, JsValue> {
    event
        .parse::<EventKind>()
        .map_err(|message| js_sys::Error::new(&message).into())
}

/// A theme manager bound to the page's DOM.
#[wasm_bindgen(js_name = ThemeManager)]
pub struct JsThemeManager {
    inner: ThemeManager<WebHost>,
    subscriptions: Vec<(EventKind, Function, Listener)>,
}

impl JsThemeManager {
    /// The manager, or `DestroyedError` once `destroy` has run.
    fn live(&self) -> Result<&ThemeManager<WebHost>, JsValue> {
        if self.inner.is_destroyed() {
            return Err(to_js_error(ThemeError::Destroyed));
        }
        Ok(&self.inner)
    }
}

#[wasm_bindgen(js_class = ThemeManager)]
impl JsThemeManager {
    /// Options: `root` (selector or Element), `baseVariables`,
    /// `disableFollowSystemTheme`, `afterToggle(name, data)`.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<JsThemeManager, JsValue> {
        let host = WebHost::new().map_err(to_js_error)?;
        let config = config_from_js(&options).map_err(to_js_error)?;
        let inner = ThemeManager::new(&host, config).map_err(to_js_error)?;
        Ok(JsThemeManager {
            inner,
            subscriptions: Vec::new(),
        })
    }

    pub fn register(&self, name: &str, data: JsValue) -> Result<(), JsValue> {
        let inner = self.live()?;
        let vars = variables_from_js(name, &data).map_err(to_js_error)?;
        inner.register(name, vars).map_err(to_js_error)?;
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> Result<(), JsValue> {
        self.live()?.unregister(name).map_err(to_js_error)?;
        Ok(())
    }

    pub fn toggle(&self, name: Option<String>) -> Result<(), JsValue> {
        self.live()?.toggle(name.as_deref()).map_err(to_js_error)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = getCurrentTheme)]
    pub fn current_theme(&self) -> Result<Option<String>, JsValue> {
        self.live()?.current_theme().map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = getThemeData)]
    pub fn theme_data(&self, name: Option<String>) -> Result<JsValue, JsValue> {
        let data = self
            .live()?
            .theme_data(name.as_deref())
            .map_err(to_js_error)?;
        Ok(optional_variables_to_js(data.as_ref()))
    }

    #[wasm_bindgen(js_name = getAllThemes)]
    pub fn all_themes(&self) -> Result<Array, JsValue> {
        let themes = Array::new();
        for info in self.live()?.themes().map_err(to_js_error)? {
            let object = Object::new();
            Reflect::set(&object, &"name".into(), &JsValue::from_str(&info.name))?;
            Reflect::set(&object, &"data".into(), &variables_to_js(&info.data))?;
            Reflect::set(&object, &"active".into(), &JsValue::from_bool(info.active))?;
            themes.push(&object);
        }
        Ok(themes)
    }

    #[wasm_bindgen(js_name = getThemeNames)]
    pub fn theme_names(&self) -> Result<Array, JsValue> {
        let names = self.live()?.theme_names().map_err(to_js_error)?;
        Ok(names.iter().map(|name| JsValue::from_str(name)).collect())
    }

    #[wasm_bindgen(js_name = hasTheme)]
    pub fn has_theme(&self, name: &str) -> Result<bool, JsValue> {
        self.live()?.has_theme(name).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = getSystemTheme)]
    pub fn system_theme(&self) -> Result<String, JsValue> {
        let mode = self.live()?.system_theme().map_err(to_js_error)?;
        Ok(mode.as_str().to_string())
    }

    #[wasm_bindgen(js_name = cloneTheme)]
    pub fn clone_theme(&self, source: &str, target: &str, overrides: JsValue) -> Result<(), JsValue> {
        let inner = self.live()?;
        let overrides = variables_from_js(target, &overrides).map_err(to_js_error)?;
        inner
            .clone_theme(source, target, overrides)
            .map_err(to_js_error)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = updateBaseVariables)]
    pub fn update_base_variables(&self, patch: JsValue) -> Result<(), JsValue> {
        let inner = self.live()?;
        let patch = variables_from_js("base variables", &patch).map_err(to_js_error)?;
        inner
            .update_base_variables(patch)
            .map_err(to_js_error)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = getCssText)]
    pub fn css_text(&self) -> Result<String, JsValue> {
        self.live()?.css_text().map_err(to_js_error)
    }

    /// Subscribes `callback` to `event`. Subscribing twice has no effect.
    pub fn on(&mut self, event: &str, callback: Function) -> Result<(), JsValue> {
        self.live()?;
        let kind = parse_kind(event)?;
        if self
            .subscriptions
            .iter()
            .any(|(k, f, _)| *k == kind && *f == callback)
        {
            return Ok(());
        }

        let target = callback.clone();
        let bridge = listener(move |event| {
            target
                .call1(&JsValue::NULL, &event_to_js(event))
                .map(|_| ())
                .map_err(|err| anyhow::anyhow!(describe(&err)))
        });
        self.inner
            .on(kind, bridge.clone())
            .map_err(to_js_error)?;
        self.subscriptions.push((kind, callback, bridge));
        Ok(())
    }

    pub fn off(&mut self, event: &str, callback: Function) -> Result<(), JsValue> {
        self.live()?;
        let kind = parse_kind(event)?;
        let Some(position) = self
            .subscriptions
            .iter()
            .position(|(k, f, _)| *k == kind && *f == callback)
        else {
            return Ok(());
        };
        let (_, _, bridge) = self.subscriptions.remove(position);
        self.inner.off(kind, &bridge).map_err(to_js_error)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = clearListeners)]
    pub fn clear_listeners(&mut self, event: Option<String>) -> Result<(), JsValue> {
        self.live()?;
        let kind = event.as_deref().map(parse_kind).transpose()?;
        self.inner.clear_listeners(kind).map_err(to_js_error)?;
        self.subscriptions
            .retain(|(k, _, _)| kind.is_some_and(|kind| kind != *k));
        Ok(())
    }

    /// Status as a plain camelCase object. Available after `destroy`.
    #[wasm_bindgen(js_name = getStatus)]
    pub fn status(&self) -> Result<JsValue, JsValue> {
        let status = self.inner.status();
        let current = status
            .current_theme
            .as_deref()
            .map(JsValue::from_str)
            .unwrap_or(JsValue::NULL);
        let object = Object::new();
        Reflect::set(&object, &"destroyed".into(), &JsValue::from_bool(status.destroyed))?;
        Reflect::set(&object, &"themeCount".into(), &JsValue::from(status.theme_count as u32))?;
        Reflect::set(&object, &"currentTheme".into(), &current)?;
        Reflect::set(
            &object,
            &"systemTheme".into(),
            &JsValue::from_str(status.system_theme.as_str()),
        )?;
        Reflect::set(
            &object,
            &"followSystemTheme".into(),
            &JsValue::from_bool(status.follow_system_theme),
        )?;
        Reflect::set(
            &object,
            &"listenerCount".into(),
            &JsValue::from(status.listener_count as u32),
        )?;
        Ok(object.into())
    }

    pub fn destroy(&mut self) {
        self.subscriptions.clear();
        self.inner.destroy();
    }
}
