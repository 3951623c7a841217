#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for the step navigator.
//!
//! Wraps [`StepNavigator`] with JS-friendly types. Inputs arrive as the JSON
//! objects documented in [`crate::input_parser`]; effects leave as a JSON
//! array of commands. Only compiled on `wasm32` targets.

use std::collections::HashMap;

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use secnav_core::{SectionDescriptor, SectionRegistry};
use secnav_i18n::{LocaleStrings, StringCatalog};
use secnav_runtime::NavigatorConfig;
use web_time::Duration;

use crate::input_parser::{commands_to_json, parse_host_input};
use crate::step::StepNavigator;

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = match info.location() {
                Some(loc) => format!("panic at {}:{}: {info}", loc.file(), loc.line()),
                None => format!("panic: {info}"),
            };
            console_error(&msg);
        }));
    });
}

fn set_js(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

fn js_error(msg: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&msg.to_string())
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

/// Section navigator exposed to JS.
#[wasm_bindgen]
pub struct SectionNavWeb {
    inner: StepNavigator,
    catalog: Option<StringCatalog>,
}

#[wasm_bindgen]
impl SectionNavWeb {
    /// `sections` is a JSON array of `{ id, labelKey }`; `config` is an
    /// optional JSON navigator configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(sections: &str, config: Option<String>) -> Result<SectionNavWeb, JsValue> {
        install_panic_hook();
        let descriptors: Vec<SectionDescriptor> =
            serde_json::from_str(sections).map_err(js_error)?;
        let registry = SectionRegistry::new(descriptors).map_err(js_error)?;
        let config = match config {
            Some(json) => NavigatorConfig::from_json_str(&json)
                .and_then(NavigatorConfig::validated)
                .map_err(js_error)?,
            None => NavigatorConfig::default(),
        };
        Ok(Self {
            inner: StepNavigator::new(registry, config),
            catalog: None,
        })
    }

    /// Mount with the page's current `location.hash`.
    pub fn mount(&mut self, fragment: Option<String>) {
        self.inner.mount(fragment);
    }

    /// Queue one JSON input. Returns `false` for inputs without a mapping.
    pub fn input(&mut self, json: &str) -> Result<bool, JsValue> {
        match parse_host_input(json).map_err(js_error)? {
            Some(input) => {
                self.inner.push_input(input);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Advance the clock by `dt_ms` milliseconds.
    #[wasm_bindgen(js_name = advanceTime)]
    pub fn advance_time(&mut self, dt_ms: f64) {
        if dt_ms.is_finite() && dt_ms > 0.0 {
            self.inner
                .advance_time(Duration::from_micros((dt_ms * 1000.0) as u64));
        }
    }

    /// Set the clock to `ms` (ignored if it would run backwards).
    #[wasm_bindgen(js_name = setTime)]
    pub fn set_time(&mut self, ms: f64) {
        if ms.is_finite() && ms >= 0.0 {
            self.inner.set_time(Duration::from_micros((ms * 1000.0) as u64));
        }
    }

    /// Process queued inputs. Returns whether the active section changed.
    pub fn step(&mut self) -> bool {
        self.inner.step().active_changed
    }

    /// JSON array of commands for the shell to apply.
    #[wasm_bindgen(js_name = drainCommands)]
    pub fn drain_commands(&mut self) -> Result<String, JsValue> {
        commands_to_json(&self.inner.drain_commands()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = activeId)]
    pub fn active_id(&self) -> Option<String> {
        self.inner.current_active_id().map(|id| id.to_string())
    }

    /// `{ left, width }` or `null`.
    pub fn indicator(&self) -> JsValue {
        match self.inner.indicator() {
            Some(geometry) => {
                let obj = Object::new();
                set_js(&obj, "left", JsValue::from_f64(geometry.left));
                set_js(&obj, "width", JsValue::from_f64(geometry.width));
                obj.into()
            }
            None => JsValue::NULL,
        }
    }

    /// Install label strings for `locale` from a JSON object of key/text.
    #[wasm_bindgen(js_name = setLabels)]
    pub fn set_labels(&mut self, locale: &str, json: &str) -> Result<(), JsValue> {
        let map: HashMap<String, String> = serde_json::from_str(json).map_err(js_error)?;
        let mut strings = LocaleStrings::new();
        for (key, text) in map {
            strings.insert(key, text);
        }
        match &mut self.catalog {
            Some(catalog) => {
                catalog.add_locale(locale, strings);
                catalog.set_locale(locale).map_err(js_error)?;
            }
            None => self.catalog = Some(StringCatalog::new(locale, strings)),
        }
        Ok(())
    }

    /// Array of `{ id, text, selected }` in tab order.
    #[wasm_bindgen(js_name = tabLabels)]
    pub fn tab_labels(&self) -> Array {
        let fallback = |_: &str| None::<String>;
        let labels = match &self.catalog {
            Some(catalog) => self.inner.tab_labels(catalog),
            None => self.inner.tab_labels(&fallback),
        };
        let out = Array::new();
        for label in labels {
            let obj = Object::new();
            set_js(&obj, "id", JsValue::from_str(label.id.as_str()));
            set_js(&obj, "text", JsValue::from_str(&label.text));
            set_js(&obj, "selected", JsValue::from_bool(label.selected));
            out.push(&obj.into());
        }
        out
    }

    pub fn unmount(&mut self) {
        self.inner.unmount();
    }
}
