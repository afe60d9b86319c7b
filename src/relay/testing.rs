//! Fakes and fixtures for relay tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::mpsc;

use super::RelayContext;
use crate::features::audit::AuditLog;
use crate::features::completion::{fragment_channel, CompletionClient, FragmentStream, StreamEvent};
use crate::features::personas::{Persona, PersonaRegistry, PromptLoader};
use crate::features::session::Turn;

pub(crate) const KAGEMITSU_PROMPT: &str = "You are Kagemitsu, a wandering samurai.";

pub(crate) enum Script {
    /// Emit these events immediately
    Events(Vec<StreamEvent>),
    /// Keep the producer so the test can feed events later (or never)
    Hold,
}

/// Completion client that replays scripted responses and records requests.
#[derive(Default)]
pub(crate) struct ScriptedCompletion {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<Vec<Turn>>>,
    held: Mutex<VecDeque<mpsc::Sender<StreamEvent>>>,
}

impl ScriptedCompletion {
    pub(crate) fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(ScriptedCompletion {
            scripts: Mutex::new(scripts.into()),
            ..Default::default()
        })
    }

    pub(crate) fn requests(&self) -> Vec<Vec<Turn>> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn take_held(&self) -> Option<mpsc::Sender<StreamEvent>> {
        self.held.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn stream_complete(&self, messages: Vec<Turn>) -> FragmentStream {
        self.requests.lock().unwrap().push(messages);

        let (tx, stream) = fragment_channel();
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or(Script::Hold);
        match script {
            Script::Events(events) => {
                for event in events {
                    tx.try_send(event).unwrap();
                }
            }
            Script::Hold => self.held.lock().unwrap().push_back(tx),
        }
        stream
    }
}

pub(crate) fn reply(fragments: &[&str]) -> Script {
    let mut events: Vec<StreamEvent> = fragments
        .iter()
        .map(|f| StreamEvent::Fragment(f.to_string()))
        .collect();
    events.push(StreamEvent::End);
    Script::Events(events)
}

/// Registry with `kagemitsu` and `ai` (prompts on disk) and `broken` (prompt
/// missing), plus an audit log inside the returned temp dir.
pub(crate) fn fixture(completion: Arc<dyn CompletionClient>) -> (Arc<RelayContext>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("prompts")).unwrap();
    std::fs::write(dir.path().join("prompts/kagemitsu.md"), KAGEMITSU_PROMPT).unwrap();
    std::fs::write(dir.path().join("prompts/ai.md"), "You are a helpful assistant.").unwrap();

    let persona = |id: &str, name: &str| Persona {
        id: id.to_string(),
        mention: format!("@{id}"),
        name: name.to_string(),
        prompt_source: format!("prompts/{id}.md"),
        color: None,
    };
    let registry = PersonaRegistry::from_personas(vec![
        persona("kagemitsu", "景光"),
        persona("ai", "AI"),
        persona("broken", "Broken"),
    ])
    .unwrap();

    let ctx = RelayContext::new(
        registry,
        PromptLoader::with_base_dir(dir.path()),
        completion,
        AuditLog::new(dir.path().join("logs/groq_api.log")),
    );
    (Arc::new(ctx), dir)
}
