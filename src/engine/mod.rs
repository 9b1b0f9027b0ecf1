//! QuickJS engine integration.
//!
//! Wires the sandbox decision points into an embedded QuickJS instance:
//! host-class resolution consults [`ClassAccessPolicy`], live-object exposure
//! goes through [`HostGate`], the engine's periodic interrupt callback polls
//! the [`ExecutionGuard`](crate::guard::ExecutionGuard), and nested
//! evaluation runs through the [`RecursionGuard`](crate::guard::RecursionGuard).
//!
//! One [`Evaluator`] per execution thread; the engine runs scripts
//! synchronously on the invoking thread.

mod convert;
mod host;

pub use convert::{js_to_json, json_to_js};
pub use host::{HostClass, HostGate, HostRegistry};

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use rquickjs::function::{Func, Rest};
use rquickjs::{Context, Ctx, Exception, Function, Object, Runtime, Value};
use serde_json::Value as JsonValue;

use crate::audit::{report, SecurityEvent};
use crate::config::SandboxConfig;
use crate::context::SandboxContext;
use crate::error::SandboxError;
use crate::guard::CancellationSignal;
use crate::policy::{ClassAccessPolicy, RuntimeObjectFilter};

/// `name` property of script-visible denial errors. Scripts may catch them;
/// uncaught they map to [`SandboxError::AccessDenied`].
pub(crate) const ACCESS_DENIED_ERROR: &str = "AccessDeniedError";
const RECURSION_ERROR: &str = "RecursionError";

/// Sandboxed script evaluator over one embedded QuickJS instance.
///
/// Thread-confined: owns the engine runtime, its context and the
/// per-execution [`SandboxContext`]. The shared immutable policy objects
/// arrive by `Arc` from the embedding application.
pub struct Evaluator {
    context: Context,
    #[allow(dead_code)]
    runtime: Runtime,
    sandbox: Rc<SandboxContext>,
    console: Rc<RefCell<Vec<String>>>,
    max_code_length: usize,
}

impl Evaluator {
    pub fn new(
        config: &SandboxConfig,
        policy: Arc<ClassAccessPolicy>,
        objects: Arc<RuntimeObjectFilter>,
        registry: Arc<HostRegistry>,
        cancellation: Option<CancellationSignal>,
    ) -> Result<Self, SandboxError> {
        let runtime = Runtime::new().map_err(|e| SandboxError::EngineError(e.to_string()))?;
        if config.max_memory > 0 {
            runtime.set_memory_limit(config.max_memory);
        }
        if config.max_stack_size > 0 {
            runtime.set_max_stack_size(config.max_stack_size);
        }

        let gate = HostGate::new(Arc::clone(&objects), policy.audit_handle());
        let sandbox = Rc::new(SandboxContext::new(policy, objects, config, cancellation));

        // The engine invokes this callback at a bounded interval of
        // interpreted operations; returning true aborts the current script.
        {
            let sandbox = Rc::clone(&sandbox);
            runtime.set_interrupt_handler(Some(Box::new(move || sandbox.poll().is_err())));
        }

        let context =
            Context::full(&runtime).map_err(|e| SandboxError::EngineError(e.to_string()))?;
        let console = Rc::new(RefCell::new(Vec::new()));
        context
            .with(|ctx| {
                install_globals(
                    &ctx,
                    Rc::clone(&sandbox),
                    registry,
                    gate,
                    Rc::clone(&console),
                )
            })
            .map_err(|e| SandboxError::EngineError(e.to_string()))?;

        Ok(Self {
            context,
            runtime,
            sandbox,
            console,
            max_code_length: config.max_code_length,
        })
    }

    /// Evaluate a script source string, returning its completion value.
    pub fn eval(&self, source: &str) -> Result<JsonValue, SandboxError> {
        self.eval_with_bindings(source, &HashMap::new())
    }

    /// Evaluate with the given values bound as globals beforehand.
    pub fn eval_with_bindings(
        &self,
        source: &str,
        bindings: &HashMap<String, JsonValue>,
    ) -> Result<JsonValue, SandboxError> {
        if source.len() > self.max_code_length {
            return Err(SandboxError::CodeTooLarge {
                max: self.max_code_length,
                actual: source.len(),
            });
        }
        self.sandbox.begin()?;
        let outcome = self.context.with(|ctx| -> Result<JsonValue, SandboxError> {
            let globals = ctx.globals();
            for (name, value) in bindings {
                let bound =
                    convert::json_to_js(&ctx, value).map_err(|e| map_engine_error(&ctx, e))?;
                globals
                    .set(name.as_str(), bound)
                    .map_err(|e| map_engine_error(&ctx, e))?;
            }
            match ctx.eval::<Value, _>(source) {
                Ok(value) => convert::js_to_json(&value),
                Err(error) => Err(map_engine_error(&ctx, error)),
            }
        });
        let outcome = self.sandbox.resolve(outcome);
        if let Err(error) = &outcome {
            self.report_interrupt(error);
        }
        self.sandbox.end(outcome.as_ref().err());
        outcome
    }

    /// Drain lines captured from the script's `console`.
    pub fn take_console(&self) -> Vec<String> {
        std::mem::take(&mut *self.console.borrow_mut())
    }

    pub fn sandbox(&self) -> &SandboxContext {
        &self.sandbox
    }

    fn report_interrupt(&self, error: &SandboxError) {
        let event = match error {
            SandboxError::Timeout(ms) => SecurityEvent::execution_timeout(*ms),
            SandboxError::Cancelled => SecurityEvent::execution_cancelled(),
            SandboxError::RecursionLimit(max) => SecurityEvent::recursion_limit_hit(*max),
            _ => return,
        };
        report(&*self.sandbox.policy().audit_handle(), event);
    }
}

fn install_globals<'js>(
    ctx: &Ctx<'js>,
    sandbox: Rc<SandboxContext>,
    registry: Arc<HostRegistry>,
    gate: HostGate,
    console: Rc<RefCell<Vec<String>>>,
) -> rquickjs::Result<()> {
    let globals = ctx.globals();

    {
        let sandbox = Rc::clone(&sandbox);
        let import = move |cx: Ctx<'js>, name: String| -> rquickjs::Result<Value<'js>> {
            import_class(&cx, &sandbox, &registry, &gate, &name)
        };
        globals.set("importClass", Func::from(import))?;
    }

    {
        let sandbox = Rc::clone(&sandbox);
        let eval_nested = move |cx: Ctx<'js>, source: String| -> rquickjs::Result<Value<'js>> {
            nested_eval(&cx, &sandbox, &source)
        };
        globals.set("evalScript", Func::from(eval_nested))?;
    }

    {
        let sink = Rc::clone(&console);
        let log = Function::new(ctx.clone(), move |args: Rest<Value<'js>>| {
            let mut parts = Vec::with_capacity(args.0.len());
            for arg in &args.0 {
                parts.push(console_fragment(arg));
            }
            sink.borrow_mut().push(parts.join(" "));
        })?;
        let console_obj = Object::new(ctx.clone())?;
        console_obj.set("log", log.clone())?;
        console_obj.set("info", log.clone())?;
        console_obj.set("warn", log.clone())?;
        console_obj.set("error", log)?;
        globals.set("console", console_obj)?;
    }

    Ok(())
}

/// Resolve a host class by dotted name for script scope.
///
/// The name-based policy check runs before any registry lookup; denial
/// surfaces as a script-visible tagged error, the way the engine reports a
/// failed resolution.
fn import_class<'js>(
    ctx: &Ctx<'js>,
    sandbox: &SandboxContext,
    registry: &HostRegistry,
    gate: &HostGate,
    name: &str,
) -> rquickjs::Result<Value<'js>> {
    if !sandbox.policy().is_visible(name) {
        return Err(throw_access_denied(ctx, name));
    }
    let Some(entry) = registry.get(name) else {
        return Err(Exception::throw_type(
            ctx,
            &format!("unknown host class '{name}'"),
        ));
    };
    let value = entry.class().construct(gate, ctx.clone())?;
    if entry.protected_members().is_empty() {
        return Ok(value);
    }
    strip_members(ctx, value, entry.protected_members())
}

/// Re-entrant evaluation exposed to scripts via `evalScript`.
fn nested_eval<'js>(
    ctx: &Ctx<'js>,
    sandbox: &SandboxContext,
    source: &str,
) -> rquickjs::Result<Value<'js>> {
    if let Err(error) = sandbox.begin() {
        return Err(throw_tagged(ctx, RECURSION_ERROR, &error.to_string(), None));
    }
    let result = ctx.eval::<Value<'js>, _>(source);
    sandbox.end(None);
    result
}

/// Copy of `value` without the protected member properties.
fn strip_members<'js>(
    ctx: &Ctx<'js>,
    value: Value<'js>,
    protected: &HashSet<String>,
) -> rquickjs::Result<Value<'js>> {
    let source = match value.as_object() {
        Some(object) => object.clone(),
        None => return Ok(value),
    };
    let facade = Object::new(ctx.clone())?;
    for prop in source.props::<String, Value<'js>>() {
        let (key, member) = prop?;
        if !protected.contains(&key) {
            facade.set(key.as_str(), member)?;
        }
    }
    Ok(facade.into_value())
}

fn console_fragment(value: &Value<'_>) -> String {
    if let Some(s) = value.as_string() {
        if let Ok(text) = s.to_string() {
            return text;
        }
    }
    match convert::js_to_json(value) {
        Ok(json) => json.to_string(),
        Err(_) => "<opaque>".to_string(),
    }
}

/// Throw a plain-object error carrying `name`/`message` (and the denied
/// class name, when present) so the failure survives the trip through the
/// engine and back into [`SandboxError`].
pub(crate) fn throw_tagged<'js>(
    ctx: &Ctx<'js>,
    name: &str,
    message: &str,
    class_name: Option<&str>,
) -> rquickjs::Error {
    let built = (|| -> rquickjs::Result<Value<'js>> {
        let error = Object::new(ctx.clone())?;
        error.set("name", name)?;
        error.set("message", message)?;
        if let Some(class_name) = class_name {
            error.set("className", class_name)?;
        }
        Ok(error.into_value())
    })();
    match built {
        Ok(value) => ctx.throw(value),
        Err(error) => error,
    }
}

fn throw_access_denied<'js>(ctx: &Ctx<'js>, class_name: &str) -> rquickjs::Error {
    throw_tagged(
        ctx,
        ACCESS_DENIED_ERROR,
        &format!("access to host class '{class_name}' is denied"),
        Some(class_name),
    )
}

fn map_engine_error(ctx: &Ctx<'_>, error: rquickjs::Error) -> SandboxError {
    if matches!(error, rquickjs::Error::Exception) {
        let thrown = ctx.catch();
        return script_error_from_value(&thrown);
    }
    SandboxError::EngineError(error.to_string())
}

fn script_error_from_value(thrown: &Value<'_>) -> SandboxError {
    if let Some(error) = thrown.as_object() {
        let name = error.get::<_, Option<String>>("name").ok().flatten();
        let message = error.get::<_, Option<String>>("message").ok().flatten();
        if name.as_deref() == Some(ACCESS_DENIED_ERROR) {
            let class = error
                .get::<_, Option<String>>("className")
                .ok()
                .flatten()
                .or_else(|| message.clone())
                .unwrap_or_default();
            return SandboxError::AccessDenied(class);
        }
        let text = match (name, message) {
            (Some(name), Some(message)) => format!("{name}: {message}"),
            (None, Some(message)) => message,
            (Some(name), None) => name,
            (None, None) => "uncaught script exception".to_string(),
        };
        return SandboxError::ScriptError(text);
    }
    if let Some(s) = thrown.as_string() {
        if let Ok(text) = s.to_string() {
            return SandboxError::ScriptError(text);
        }
    }
    SandboxError::ScriptError("uncaught script exception".to_string())
}
