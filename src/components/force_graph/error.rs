#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid format settings: {0}")]
	Settings(#[source] serde_json::Error),
	#[error("invalid capabilities descriptor: {0}")]
	CapabilitiesJson(#[source] serde_json::Error),
	#[error("capabilities entry `{entry}` has no display name key")]
	MissingDisplayNameKey { entry: String },
	#[error("settings key `{key}` is not declared in capabilities")]
	UndeclaredSetting { key: String },
	#[error("dom binding failed: {0}")]
	Dom(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<wasm_bindgen::JsValue> for Error {
	fn from(value: wasm_bindgen::JsValue) -> Self {
		Error::Dom(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}
