pub mod js_executor;

pub use js_executor::{eval_as, JsExecutor, PageSource, ScriptPage};
