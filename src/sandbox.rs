//! Execution sandbox for server-side script fragments.
//!
//! Scripts run in an embedded Rhai interpreter. Everything a script prints is
//! captured into a buffer and only handed back once the script finishes, so a
//! failure halfway through never leaks a half-written fragment. Failures of any
//! shape (syntax, `throw`, limits, panics) come back as an [`InjectionResult`]
//! carrying an inline HTML comment; nothing propagates to the caller.
//!
//! This is failure containment, not a security boundary: scripts are trusted
//! operator code and keep the full standard Rhai library.

use crate::context::RequestContext;
use crate::error::ScriptError;
use crate::markup::diagnostic_comment;
use crate::types::{CodeFragment, Scope};
use parking_lot::Mutex;
use rhai::{Array, Dynamic, Engine, EvalAltResult, Map, Position};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const TIME_LIMIT_TOKEN: &str = "time-limit";
const OUTPUT_LIMIT_TOKEN: &str = "output-limit";

/// Call depth used when `max_call_levels` is `0`.
pub const DEFAULT_CALL_LEVELS: usize = 64;
/// Highest accepted `max_call_levels`.
pub const MAX_CALL_LEVELS: usize = 1024;

// Script thread stack: a fixed base plus a slice per call level.
const STACK_BASE_BYTES: usize = 4 * 1024 * 1024;
const STACK_PER_CALL_LEVEL_BYTES: usize = 256 * 1024;

/// Resource limits for one script execution.
///
/// `0` disables a limit, except `max_call_levels` where `0` selects
/// [`DEFAULT_CALL_LEVELS`]. Scripts run on a dedicated thread whose stack
/// grows with the call depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Maximum interpreter operations
    #[serde(default = "default_max_operations")]
    pub max_operations: u64,

    /// Maximum function call nesting (at most [`MAX_CALL_LEVELS`])
    #[serde(default = "default_max_call_levels")]
    pub max_call_levels: usize,

    /// Maximum length of any single string value (bytes)
    #[serde(default = "default_max_string_size")]
    pub max_string_size: usize,

    /// Maximum number of elements in any array
    #[serde(default = "default_max_array_size")]
    pub max_array_size: usize,

    /// Maximum number of properties in any object map
    #[serde(default = "default_max_map_size")]
    pub max_map_size: usize,

    /// Maximum captured output (bytes)
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    /// Wall-clock budget (milliseconds)
    #[serde(default = "default_time_limit_ms")]
    pub time_limit_ms: u64,
}

fn default_max_operations() -> u64 {
    1_000_000
}

fn default_max_call_levels() -> usize {
    DEFAULT_CALL_LEVELS
}

fn default_max_string_size() -> usize {
    1024 * 1024 // 1 MB
}

fn default_max_array_size() -> usize {
    10_000
}

fn default_max_map_size() -> usize {
    10_000
}

fn default_max_output_bytes() -> usize {
    1024 * 1024 // 1 MB
}

fn default_time_limit_ms() -> u64 {
    2_000
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_operations: default_max_operations(),
            max_call_levels: default_max_call_levels(),
            max_string_size: default_max_string_size(),
            max_array_size: default_max_array_size(),
            max_map_size: default_max_map_size(),
            max_output_bytes: default_max_output_bytes(),
            time_limit_ms: default_time_limit_ms(),
        }
    }
}

impl SandboxConfig {
    /// No limits beyond the default call depth.
    pub fn unlimited() -> Self {
        Self {
            max_operations: 0,
            max_call_levels: 0,
            max_string_size: 0,
            max_array_size: 0,
            max_map_size: 0,
            max_output_bytes: 0,
            time_limit_ms: 0,
        }
    }

    /// Call depth actually enforced.
    pub fn call_levels(&self) -> usize {
        if self.max_call_levels == 0 {
            DEFAULT_CALL_LEVELS
        } else {
            self.max_call_levels.min(MAX_CALL_LEVELS)
        }
    }

    /// Stack size of the thread a script runs on.
    fn stack_size(&self) -> usize {
        STACK_BASE_BYTES + self.call_levels() * STACK_PER_CALL_LEVEL_BYTES
    }

    fn time_limit(&self) -> Option<Duration> {
        (self.time_limit_ms > 0).then(|| Duration::from_millis(self.time_limit_ms))
    }
}

/// Human-readable description of a contained failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
}

impl From<&ScriptError> for ErrorInfo {
    fn from(err: &ScriptError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Outcome of one execution attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionResult {
    pub emitted_markup: String,
    pub error: Option<ErrorInfo>,
}

impl InjectionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Shared capture buffer behind `print` and `echo`.
#[derive(Clone)]
struct OutputSink {
    buffer: Arc<Mutex<String>>,
    overflowed: Arc<AtomicBool>,
    limit: usize,
}

impl OutputSink {
    fn new(limit: usize) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(String::new())),
            overflowed: Arc::new(AtomicBool::new(false)),
            limit,
        }
    }

    fn write(&self, text: &str) {
        if self.overflowed.load(Ordering::Relaxed) {
            return;
        }
        let mut buffer = self.buffer.lock();
        if self.limit > 0 && buffer.len() + text.len() > self.limit {
            self.overflowed.store(true, Ordering::Relaxed);
            return;
        }
        buffer.push_str(text);
    }

    fn write_line(&self, text: &str) {
        self.write(text);
        self.write("\n");
    }

    fn overflowed(&self) -> bool {
        self.overflowed.load(Ordering::Relaxed)
    }

    fn take(&self) -> String {
        std::mem::take(&mut *self.buffer.lock())
    }
}

/// Runs server-side script text with output capture and failure containment.
#[derive(Debug, Clone, Default)]
pub struct ScriptSandbox {
    config: SandboxConfig,
}

impl ScriptSandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Execute script text with no request context.
    pub fn execute(&self, script: &str) -> InjectionResult {
        self.execute_labeled(script, "Script error", &RequestContext::default())
    }

    /// Execute script text with `ctx` exposed to the script.
    pub fn execute_with_context(&self, script: &str, ctx: &RequestContext) -> InjectionResult {
        self.execute_labeled(script, "Script error", ctx)
    }

    /// Execute a stored fragment; the diagnostic names the fragment's scope.
    pub fn execute_fragment(&self, fragment: &CodeFragment, ctx: &RequestContext) -> InjectionResult {
        let label = match fragment.scope {
            Scope::Global => "Global script error",
            Scope::Resource(_) => "Resource script error",
        };
        let result = self.execute_labeled(&fragment.content, label, ctx);
        match &result.error {
            None if !fragment.is_empty() => info!(
                scope = %fragment.scope,
                digest = %fragment.digest(),
                output_bytes = result.emitted_markup.len(),
                "Executed server script fragment"
            ),
            Some(error) => warn!(
                scope = %fragment.scope,
                digest = %fragment.digest(),
                error = %error.message,
                "Server script fragment failed"
            ),
            None => {}
        }
        result
    }

    fn execute_labeled(&self, script: &str, label: &str, ctx: &RequestContext) -> InjectionResult {
        if script.is_empty() {
            return InjectionResult::empty();
        }
        match self.run(script, ctx) {
            Ok(output) => InjectionResult {
                emitted_markup: output,
                error: None,
            },
            Err(err) => {
                let info = ErrorInfo::from(&err);
                InjectionResult {
                    emitted_markup: diagnostic_comment(label, &info.message),
                    error: Some(info),
                }
            }
        }
    }

    fn run(&self, script: &str, ctx: &RequestContext) -> Result<String, ScriptError> {
        let sink = OutputSink::new(self.config.max_output_bytes);
        let engine = self.build_engine(&sink);

        let mut scope = rhai::Scope::new();
        scope.push_constant("ctx", context_map(ctx));

        // Deep recursion must hit the call limit before the native stack runs out.
        let outcome = thread::scope(|s| {
            thread::Builder::new()
                .name("codeweave-script".to_string())
                .stack_size(self.config.stack_size())
                .spawn_scoped(s, || {
                    panic::catch_unwind(AssertUnwindSafe(|| {
                        engine.run_with_scope(&mut scope, script)
                    }))
                })
                .map(|handle| handle.join())
        });

        match outcome {
            Err(err) => Err(ScriptError::Runtime(format!(
                "Failed to start script thread: {}",
                err
            ))),
            Ok(Err(payload)) | Ok(Ok(Err(payload))) => {
                Err(ScriptError::Panicked(panic_message(payload)))
            }
            Ok(Ok(Ok(Err(err)))) => Err(self.classify(*err)),
            Ok(Ok(Ok(Ok(())))) if sink.overflowed() => Err(self.output_limit_error()),
            Ok(Ok(Ok(Ok(())))) => Ok(sink.take()),
        }
    }

    fn build_engine(&self, sink: &OutputSink) -> Engine {
        let mut engine = Engine::new();

        if self.config.max_operations > 0 {
            engine.set_max_operations(self.config.max_operations);
        }
        engine.set_max_call_levels(self.config.call_levels());
        if self.config.max_string_size > 0 {
            engine.set_max_string_size(self.config.max_string_size);
        }
        if self.config.max_array_size > 0 {
            engine.set_max_array_size(self.config.max_array_size);
        }
        if self.config.max_map_size > 0 {
            engine.set_max_map_size(self.config.max_map_size);
        }

        let print_sink = sink.clone();
        engine.on_print(move |text| print_sink.write_line(text));

        let echo_sink = sink.clone();
        engine.register_fn("echo", move |value: Dynamic| echo_sink.write(&value.to_string()));

        #[cfg(test)]
        engine.register_fn("force_panic", |message: rhai::ImmutableString| -> () {
            panic!("{}", message)
        });

        engine.on_debug(|text, source, pos: Position| {
            debug!(source = source.unwrap_or("fragment"), position = %pos, "{}", text);
        });

        let progress_sink = sink.clone();
        let started = Instant::now();
        let time_limit = self.config.time_limit();
        engine.on_progress(move |_operations| {
            if progress_sink.overflowed() {
                return Some(Dynamic::from(OUTPUT_LIMIT_TOKEN.to_string()));
            }
            match time_limit {
                Some(limit) if started.elapsed() > limit => {
                    Some(Dynamic::from(TIME_LIMIT_TOKEN.to_string()))
                }
                _ => None,
            }
        });

        engine
    }

    fn classify(&self, err: EvalAltResult) -> ScriptError {
        match err {
            EvalAltResult::ErrorParsing(..) => ScriptError::Compile(err.to_string()),
            EvalAltResult::ErrorRuntime(value, _) => ScriptError::Runtime(value.to_string()),
            EvalAltResult::ErrorTerminated(token, _) => {
                if token.to_string() == OUTPUT_LIMIT_TOKEN {
                    self.output_limit_error()
                } else {
                    ScriptError::LimitExceeded(format!(
                        "Script exceeded time limit of {} ms",
                        self.config.time_limit_ms
                    ))
                }
            }
            EvalAltResult::ErrorTooManyOperations(_)
            | EvalAltResult::ErrorStackOverflow(_)
            | EvalAltResult::ErrorDataTooLarge(..) => ScriptError::LimitExceeded(err.to_string()),
            other => ScriptError::Runtime(other.to_string()),
        }
    }

    fn output_limit_error(&self) -> ScriptError {
        ScriptError::LimitExceeded(format!(
            "Script output exceeded {} bytes",
            self.config.max_output_bytes
        ))
    }
}

/// Read-only view of the request handed to scripts as `ctx`.
fn context_map(ctx: &RequestContext) -> Map {
    let optional_text = |value: Option<&str>| {
        value
            .map(|text| Dynamic::from(text.to_string()))
            .unwrap_or(Dynamic::UNIT)
    };

    let mut map = Map::new();
    map.insert("singular".into(), Dynamic::from(ctx.is_singular()));
    map.insert(
        "resource_id".into(),
        ctx.resource_id()
            .and_then(|id| i64::try_from(id).ok())
            .map(Dynamic::from)
            .unwrap_or(Dynamic::UNIT),
    );
    map.insert("slug".into(), optional_text(ctx.resource_slug()));
    map.insert("title".into(), optional_text(ctx.resource_title()));
    map.insert(
        "type".into(),
        ctx.resource_type()
            .map(|t| Dynamic::from(t.to_string()))
            .unwrap_or(Dynamic::UNIT),
    );
    let categories: Array = ctx
        .category_slugs()
        .iter()
        .map(|slug| Dynamic::from(slug.clone()))
        .collect();
    map.insert("categories".into(), Dynamic::from_array(categories));
    map
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
