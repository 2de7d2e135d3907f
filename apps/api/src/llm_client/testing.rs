//! Scripted `Generator` for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::signature::{Prediction, Signature};
use super::{Generator, LlmError};

/// What the scripted generator does on every call.
#[derive(Debug, Clone)]
pub enum Script {
    Reply(Value),
    Fail,
    Hang,
}

/// One recorded call: signature name and the inputs it was given.
pub type RecordedCall = (String, Vec<(String, String)>);

pub struct ScriptedGenerator {
    script: Script,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGenerator {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(value: Value) -> Self {
        Self::new(Script::Reply(value))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Input value of the first recorded call.
    pub fn input(&self, name: &str) -> Option<String> {
        self.calls()
            .first()
            .and_then(|(_, inputs)| inputs.iter().find(|(n, _)| n == name).cloned())
            .map(|(_, v)| v)
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn predict(
        &self,
        signature: &Signature,
        inputs: &[(&str, String)],
    ) -> Result<Prediction, LlmError> {
        self.calls.lock().unwrap().push((
            signature.name.to_string(),
            inputs
                .iter()
                .map(|(n, v)| (n.to_string(), v.clone()))
                .collect(),
        ));

        match &self.script {
            Script::Reply(value) => Ok(Prediction::from_value(value.clone())),
            Script::Fail => Err(LlmError::Api {
                status: 429,
                message: "quota exceeded".to_string(),
            }),
            Script::Hang => {
                std::future::pending::<()>().await;
                Err(LlmError::EmptyContent)
            }
        }
    }
}
