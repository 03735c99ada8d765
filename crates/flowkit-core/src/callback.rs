//! Hook-indexed callback registry.
//!
//! Callbacks are stored per [`HookPoint`] in registration order. Callbacks
//! registered under [`HookPoint::AllHooks`] live in their own list and are
//! appended to the specific list only when a hook is invoked.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use flowkit_protocols::{callback_fn, Callback, CallbackArgs, CallbackError, HookPoint, State};

use crate::panic::panic_message;

#[derive(Clone)]
struct Entry {
    name: String,
    callback: Arc<dyn Callback>,
}

#[derive(Default)]
struct Lists {
    specific: HashMap<HookPoint, Vec<Entry>>,
    wildcard: Vec<Entry>,
}

impl Lists {
    fn list(&self, hook: HookPoint) -> Option<&Vec<Entry>> {
        if hook.is_wildcard() {
            Some(&self.wildcard)
        } else {
            self.specific.get(&hook)
        }
    }

    fn list_mut(&mut self, hook: HookPoint) -> &mut Vec<Entry> {
        if hook.is_wildcard() {
            &mut self.wildcard
        } else {
            self.specific.entry(hook).or_default()
        }
    }
}

/// Registry of named callbacks, safe to share across tasks.
#[derive(Default)]
pub struct CallbackRegistry {
    lists: RwLock<Lists>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback under `hook`.
    ///
    /// Names are unique per hook; the same name may be used under different
    /// hooks.
    pub fn register(
        &self,
        hook: HookPoint,
        name: impl Into<String>,
        callback: Arc<dyn Callback>,
    ) -> Result<(), CallbackError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CallbackError::EmptyName);
        }

        let mut lists = self.lists.write();
        let list = lists.list_mut(hook);
        if list.iter().any(|e| e.name == name) {
            return Err(CallbackError::DuplicateName { hook, name });
        }
        debug!(hook = %hook, callback = %name, "Registered callback");
        list.push(Entry { name, callback });
        Ok(())
    }

    /// Register an async closure as a callback.
    pub fn register_fn<F, Fut>(
        &self,
        hook: HookPoint,
        name: impl Into<String>,
        f: F,
    ) -> Result<(), CallbackError>
    where
        F: Fn(CancellationToken, CallbackArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<State>, CallbackError>> + Send + 'static,
    {
        self.register(hook, name, callback_fn(f))
    }

    /// Remove a callback. Unknown names are ignored with a warning.
    pub fn unregister(&self, hook: HookPoint, name: &str) {
        let mut lists = self.lists.write();
        let list = lists.list_mut(hook);
        match list.iter().position(|e| e.name == name) {
            Some(idx) => {
                list.remove(idx);
                debug!(hook = %hook, callback = %name, "Unregistered callback");
            }
            None => {
                warn!(hook = %hook, callback = %name, "Callback not found for unregister");
            }
        }
    }

    /// Number of callbacks registered directly under `hook`.
    pub fn len(&self, hook: HookPoint) -> usize {
        self.lists.read().list(hook).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        let lists = self.lists.read();
        lists.wildcard.is_empty() && lists.specific.values().all(Vec::is_empty)
    }

    /// Names registered directly under `hook`, in registration order.
    pub fn names(&self, hook: HookPoint) -> Vec<String> {
        self.lists
            .read()
            .list(hook)
            .map(|list| list.iter().map(|e| e.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Remove every registration.
    pub fn clear(&self) {
        let mut lists = self.lists.write();
        lists.specific.clear();
        lists.wildcard.clear();
    }

    /// Run the callbacks for `args.hook`, threading the state through them.
    ///
    /// Callbacks registered for the hook run first, then the wildcard ones,
    /// each in registration order. The lists are snapshotted before any
    /// callback runs, so callbacks may register or unregister freely; the
    /// change applies from the next invocation. A failing or panicking
    /// callback is logged and skipped. Returns the final state together with
    /// the last error seen.
    pub async fn invoke(
        &self,
        ctx: &CancellationToken,
        args: CallbackArgs,
    ) -> (State, Option<CallbackError>) {
        let hook = args.hook;
        let snapshot: Vec<Entry> = {
            let lists = self.lists.read();
            let specific = if hook.is_wildcard() {
                None
            } else {
                lists.specific.get(&hook)
            };
            specific
                .into_iter()
                .flatten()
                .chain(lists.wildcard.iter())
                .cloned()
                .collect()
        };

        let mut state = args.state.clone();
        let mut last_error = None;

        for entry in snapshot {
            let mut call_args = args.clone();
            call_args.state = state.clone();

            let outcome = AssertUnwindSafe(entry.callback.call(ctx, call_args))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(Some(next))) => state = next,
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    error!(hook = %hook, callback = %entry.name, error = %e, "Callback failed");
                    last_error = Some(match e {
                        already @ (CallbackError::Failed { .. } | CallbackError::Panicked { .. }) => {
                            already
                        }
                        other => CallbackError::Failed {
                            hook,
                            name: entry.name,
                            message: other.to_string(),
                        },
                    });
                }
                Err(payload) => {
                    let message = panic_message(payload);
                    error!(hook = %hook, callback = %entry.name, panic = %message, "Callback panicked");
                    last_error = Some(CallbackError::Panicked {
                        hook,
                        name: entry.name,
                        message,
                    });
                }
            }
        }

        (state, last_error)
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lists = self.lists.read();
        let mut counts: Vec<(String, usize)> = lists
            .specific
            .iter()
            .map(|(hook, list)| (hook.to_string(), list.len()))
            .collect();
        counts.sort();
        f.debug_struct("CallbackRegistry")
            .field("specific", &counts)
            .field("wildcard", &lists.wildcard.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "callback_tests.rs"]
mod tests;
