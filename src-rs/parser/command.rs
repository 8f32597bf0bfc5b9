use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::types::{DocumentParser, ParseJob, ParserError};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const STDERR_TAIL: usize = 2000;

/// Drives a parser CLI as a child process, one process per document.
pub struct CommandParser {
    program: String,
    version: String,
}

impl CommandParser {
    pub fn new(program: &str) -> Self {
        let version = query_version(program).unwrap_or_else(|| "unknown".to_string());
        Self {
            program: program.to_string(),
            version,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl DocumentParser for CommandParser {
    fn parse(&self, job: &ParseJob) -> Result<(), ParserError> {
        let input_dir = job.output_root.join(".input");
        fs::create_dir_all(&input_dir)?;
        let input = input_dir.join(format!("{}.pdf", job.stem));
        fs::write(&input, &job.document)?;

        let mut child = Command::new(&self.program)
            .args(build_args(job, &input))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| ParserError::Spawn(format!("{}: {}", self.program, err)))?;

        // Drained on its own thread so a chatty parser cannot fill the pipe and stall.
        let stderr = child.stderr.take();
        let reader = thread::spawn(move || {
            let mut buf = String::new();
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_string(&mut buf);
            }
            buf
        });

        match wait_with_deadline(&mut child, job.deadline)? {
            Some(status) if status.success() => Ok(()),
            Some(status) => {
                let stderr = reader.join().unwrap_or_default();
                Err(ParserError::Failed {
                    code: status.code(),
                    stderr: tail(&stderr, STDERR_TAIL),
                })
            }
            None => {
                tracing::warn!(
                    "{} exceeded deadline of {:?} for {}, killed",
                    self.program,
                    job.deadline,
                    job.stem
                );
                Err(ParserError::TimedOut(job.deadline))
            }
        }
    }

    fn version(&self) -> String {
        self.version.clone()
    }
}

fn build_args(job: &ParseJob, input: &Path) -> Vec<String> {
    let opts = &job.options;
    let mut args = vec![
        "-p".to_string(),
        input.display().to_string(),
        "-o".to_string(),
        job.output_root.display().to_string(),
        "-b".to_string(),
        opts.backend.engine_name().to_string(),
        "-m".to_string(),
        opts.parse_method.as_str().to_string(),
        "-l".to_string(),
        opts.lang.clone(),
        "-f".to_string(),
        opts.formula_enable.to_string(),
        "-t".to_string(),
        opts.table_enable.to_string(),
    ];
    if let Some(end) = opts.end_page() {
        args.extend(["-s".to_string(), "0".to_string(), "-e".to_string(), end.to_string()]);
    }
    args
}

fn wait_with_deadline(child: &mut Child, deadline: Duration) -> Result<Option<ExitStatus>, ParserError> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if started.elapsed() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn query_version(program: &str) -> Option<String> {
    let output = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let line = text.lines().rev().find(|line| !line.trim().is_empty())?;
    Some(line.trim().to_string())
}

fn tail(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    if trimmed.len() <= max {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - max;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    trimmed[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::{Backend, ParseMethod, ParseOptions};
    use std::path::PathBuf;

    fn job(root: PathBuf, deadline: Duration) -> ParseJob {
        ParseJob {
            document: b"%PDF-1.4\n".to_vec(),
            stem: "report".to_string(),
            output_root: root,
            options: ParseOptions::default(),
            deadline,
        }
    }

    #[test]
    fn args_carry_engine_name_and_page_range() {
        let mut job = job(PathBuf::from("/scratch"), Duration::from_secs(1));
        job.options = ParseOptions {
            backend: Backend::VlmRemote,
            parse_method: ParseMethod::Ocr,
            max_pages: Some(5),
            table_enable: false,
            ..ParseOptions::default()
        };
        let args = build_args(&job, Path::new("/scratch/.input/report.pdf"));
        assert_eq!(
            args,
            vec![
                "-p", "/scratch/.input/report.pdf", "-o", "/scratch", "-b", "vlm-http-client",
                "-m", "ocr", "-l", "ch", "-f", "true", "-t", "false", "-s", "0", "-e", "4",
            ]
        );
    }

    #[test]
    fn args_omit_page_range_when_unbounded() {
        let job = job(PathBuf::from("/scratch"), Duration::from_secs(1));
        let args = build_args(&job, Path::new("/in.pdf"));
        assert!(!args.contains(&"-e".to_string()));
    }

    #[test]
    fn tail_keeps_the_end_of_long_output() {
        let text = format!("{}END", "x".repeat(5000));
        let out = tail(&text, 10);
        assert_eq!(out.len(), 10);
        assert!(out.ends_with("END"));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let parser = CommandParser::new("/nonexistent/docgate-parser");
        assert_eq!(parser.version(), "unknown");
        let err = parser
            .parse(&job(dir.path().to_path_buf(), Duration::from_secs(5)))
            .unwrap_err();
        assert!(matches!(err, ParserError::Spawn(_)));
    }

    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-parser.sh");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_reports_stderr() {
        let bin = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let parser = CommandParser::new(&script(bin.path(), "echo 'model not found' >&2; exit 3"));
        let err = parser
            .parse(&job(out.path().to_path_buf(), Duration::from_secs(5)))
            .unwrap_err();
        match err {
            ParserError::Failed { code, stderr } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("model not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(out.path().join(".input/report.pdf").exists());
    }

    #[cfg(unix)]
    #[test]
    fn slow_parser_is_killed_at_deadline() {
        let bin = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let parser = CommandParser::new(&script(bin.path(), "[ \"$1\" = --version ] && exit 0\nexec sleep 5"));
        let started = Instant::now();
        let err = parser
            .parse(&job(out.path().to_path_buf(), Duration::from_millis(300)))
            .unwrap_err();
        assert!(matches!(err, ParserError::TimedOut(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
