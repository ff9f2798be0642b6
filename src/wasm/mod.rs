use wasm_bindgen::prelude::*;
use crate::CoreEditor;
use js_sys::Function;
use serde_wasm_bindgen::to_value;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

#[wasm_bindgen]
pub struct WasmPetriNet {
    editor: CoreEditor,
    event_listener: Option<Function>,
}

#[wasm_bindgen]
impl WasmPetriNet {
    #[wasm_bindgen(constructor)]
    pub fn new(document: &str) -> Result<WasmPetriNet, JsValue> {
        let editor = CoreEditor::new(document)
            .map_err(|e| JsValue::from_str(&format!("Initialization error: {}", e)))?;

        Ok(WasmPetriNet { editor, event_listener: None })
    }

    #[wasm_bindgen(js_name = setEventListener)]
    pub fn set_event_listener(&mut self, listener: Function) {
        self.event_listener = Some(listener);
    }

    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> Result<String, JsValue> {
        self.editor.to_json().map_err(|e| JsValue::from_str(&e))
    }

    /// Returns the ids of the pasted clones.
    #[wasm_bindgen]
    pub fn paste(&mut self, ids: Vec<String>, dx: f64, dy: f64) -> Result<Vec<String>, JsValue> {
        let pasted = self.editor.paste(&ids, dx, dy).map_err(|e| JsValue::from_str(&e))?;
        self.flush_events()?;
        Ok(pasted)
    }

    #[wasm_bindgen]
    pub fn remove(&mut self, id: &str) -> Result<(), JsValue> {
        self.editor.remove(id).map_err(|e| JsValue::from_str(&e))?;
        self.flush_events()
    }

    // Hands queued notifications to the listener in emission order.
    fn flush_events(&mut self) -> Result<(), JsValue> {
        for event in self.editor.drain_events() {
            let event_js = to_value(&event)
                .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))?;

            match &self.event_listener {
                Some(listener) => {
                    listener.call1(&JsValue::NULL, &event_js).ok();
                }
                None => console_log!("{:?} {} {}", event.change, event.kind, event.id),
            }
        }
        Ok(())
    }
}
