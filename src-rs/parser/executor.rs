use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::gate::AdmissionPermit;

use super::types::{DocumentParser, ParseJob, ParserError};

/// How a parser invocation is scheduled relative to the async runtime.
/// Chosen once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Run on tokio's blocking thread pool.
    Blocking,
    /// Run directly on the calling task. Only for parsers that return quickly.
    Inline,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Blocking => "blocking",
            ExecutionMode::Inline => "inline",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "blocking" => Ok(ExecutionMode::Blocking),
            "inline" => Ok(ExecutionMode::Inline),
            other => Err(format!("unknown execution mode: {}", other)),
        }
    }
}

pub struct ParserExecutor {
    parser: Arc<dyn DocumentParser>,
    mode: ExecutionMode,
}

impl ParserExecutor {
    pub fn new(parser: Arc<dyn DocumentParser>, mode: ExecutionMode) -> Self {
        Self { parser, mode }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn parser_version(&self) -> String {
        self.parser.version()
    }

    /// Runs one parse while holding `permit`.
    ///
    /// The permit moves into the execution unit and is released when the
    /// parser returns, even if the awaiting future is dropped first.
    pub async fn run(&self, job: ParseJob, permit: AdmissionPermit) -> Result<(), ParserError> {
        match self.mode {
            ExecutionMode::Blocking => {
                let parser = self.parser.clone();
                tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    parser.parse(&job)
                })
                .await
                .map_err(|err| ParserError::Panicked(err.to_string()))?
            }
            ExecutionMode::Inline => {
                let _permit = permit;
                self.parser.parse(&job)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::AdmissionGate;
    use crate::parser::types::ParseOptions;
    use std::path::PathBuf;
    use std::time::Duration;

    struct Flaky {
        fail: bool,
    }

    impl DocumentParser for Flaky {
        fn parse(&self, _job: &ParseJob) -> Result<(), ParserError> {
            if self.fail {
                Err(ParserError::Failed {
                    code: Some(1),
                    stderr: "boom".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    struct Panics;

    impl DocumentParser for Panics {
        fn parse(&self, _job: &ParseJob) -> Result<(), ParserError> {
            panic!("parser bug")
        }
    }

    fn job() -> ParseJob {
        ParseJob {
            document: Vec::new(),
            stem: "doc".to_string(),
            output_root: PathBuf::from("/tmp"),
            options: ParseOptions::default(),
            deadline: Duration::from_secs(1),
        }
    }

    #[test]
    fn mode_parses_from_config_strings() {
        assert_eq!("Blocking".parse::<ExecutionMode>().unwrap(), ExecutionMode::Blocking);
        assert_eq!("inline".parse::<ExecutionMode>().unwrap(), ExecutionMode::Inline);
        assert!("threads".parse::<ExecutionMode>().is_err());
    }

    #[tokio::test]
    async fn permit_is_released_after_success_and_failure() {
        let gate = AdmissionGate::new(1);
        for mode in [ExecutionMode::Blocking, ExecutionMode::Inline] {
            for fail in [false, true] {
                let executor = ParserExecutor::new(Arc::new(Flaky { fail }), mode);
                let permit = gate.try_acquire().unwrap();
                assert_eq!(gate.held(), 1);
                let result = executor.run(job(), permit).await;
                assert_eq!(result.is_err(), fail);
                assert_eq!(gate.held(), 0);
            }
        }
    }

    #[tokio::test]
    async fn panicking_parser_becomes_an_error_and_frees_the_slot() {
        let gate = AdmissionGate::new(1);
        let executor = ParserExecutor::new(Arc::new(Panics), ExecutionMode::Blocking);
        let permit = gate.try_acquire().unwrap();
        let err = executor.run(job(), permit).await.unwrap_err();
        assert!(matches!(err, ParserError::Panicked(_)));
        assert_eq!(gate.held(), 0);
    }
}
