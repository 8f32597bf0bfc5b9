use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::client::HTTPClient;
use crate::models::CLIConfig;
use crate::render;

const WAIT_POLL: Duration = Duration::from_secs(1);
const WAIT_LIMIT: usize = 1800;

pub struct REPL {
    pub config: CLIConfig,
    pub client: HTTPClient,
    pub last_task: Option<String>,
}

impl REPL {
    pub fn new(config: CLIConfig, client: HTTPClient) -> Self {
        Self {
            config,
            client,
            last_task: None,
        }
    }

    pub fn run(&mut self) {
        render::banner(&self.config);
        loop {
            render::prompt();
            let mut line = String::new();
            match io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('/') {
                if self.handle_command(&line) {
                    break;
                }
                continue;
            }
            self.parse_file(&line);
        }
    }

    fn handle_command(&mut self, line: &str) -> bool {
        let mut parts = line.splitn(2, ' ');
        let cmd = parts.next().unwrap_or("").trim_start_matches('/');
        let rest = parts.next().unwrap_or("").trim();
        match cmd {
            "exit" | "quit" => return true,
            "help" => render::help(),
            "url" => {
                if rest.is_empty() {
                    render::error("usage: /url <http(s) url>");
                } else {
                    match self.client.parse_url(rest, &self.config) {
                        Ok(resp) => render::parse(&resp),
                        Err(err) => render::error(&err),
                    }
                }
            }
            "submit" => {
                if rest.is_empty() {
                    render::error("usage: /submit <path>");
                } else {
                    match self.client.submit(Path::new(rest), &self.config) {
                        Ok(task) => {
                            render::task(&task);
                            self.last_task = Some(task.task_id);
                        }
                        Err(err) => render::error(&err),
                    }
                }
            }
            "task" => {
                if let Some(id) = self.task_id(rest) {
                    match self.client.task(&id) {
                        Ok(task) => render::task(&task),
                        Err(err) => render::error(&err),
                    }
                }
            }
            "wait" => {
                if let Some(id) = self.task_id(rest) {
                    self.wait(&id);
                }
            }
            "tasks" => {
                let limit = rest.parse::<usize>().unwrap_or(10);
                match self.client.list_tasks(limit) {
                    Ok(tasks) => render::tasks(&tasks),
                    Err(err) => render::error(&err),
                }
            }
            "health" => match self.client.health() {
                Ok(value) => render::json(&value),
                Err(err) => render::error(&err),
            },
            "version" => match self.client.version() {
                Ok(value) => render::json(&value),
                Err(err) => render::error(&err),
            },
            "backend" => {
                if rest.is_empty() {
                    render::info(&format!("backend: {}", self.config.backend));
                } else {
                    self.config.backend = rest.to_string();
                    render::info("backend updated");
                }
            }
            "lang" => {
                if rest.is_empty() {
                    render::info(&format!("lang: {}", self.config.lang));
                } else {
                    self.config.lang = rest.to_string();
                    render::info("lang updated");
                }
            }
            "method" => {
                if rest.is_empty() {
                    render::info(&format!("method: {}", self.config.parse_method));
                } else {
                    self.config.parse_method = rest.to_string();
                    render::info("method updated");
                }
            }
            "pages" => {
                if rest.is_empty() || rest == "all" {
                    self.config.max_pages = None;
                    render::info("max pages: all");
                } else if let Ok(pages) = rest.parse::<u32>() {
                    self.config.max_pages = Some(pages);
                    render::info(&format!("max pages: {}", pages));
                } else {
                    render::error("invalid page count");
                }
            }
            "tables" => match toggle(self.config.table_enable, rest) {
                Some(flag) => {
                    self.config.table_enable = flag;
                    render::info(&format!("tables: {}", flag));
                }
                None => render::error("invalid tables flag"),
            },
            "formulas" => match toggle(self.config.formula_enable, rest) {
                Some(flag) => {
                    self.config.formula_enable = flag;
                    render::info(&format!("formulas: {}", flag));
                }
                None => render::error("invalid formulas flag"),
            },
            "config" => render::config(&self.config),
            "base" => {
                if rest.is_empty() {
                    render::info(&format!("base: {}", self.config.base_url));
                } else {
                    self.config.base_url = rest.to_string();
                    self.client = HTTPClient::new(&self.config.base_url, self.config.token.clone());
                    render::info("base url updated");
                }
            }
            "token" => {
                self.config.token = if rest.is_empty() {
                    None
                } else {
                    Some(rest.to_string())
                };
                self.client = HTTPClient::new(&self.config.base_url, self.config.token.clone());
                render::info(if rest.is_empty() { "token cleared" } else { "token updated" });
            }
            _ => render::info("unknown command, type /help"),
        }
        false
    }

    fn parse_file(&self, path: &str) {
        match self.client.parse_file(Path::new(path), &self.config) {
            Ok(resp) => render::parse(&resp),
            Err(err) => render::error(&err),
        }
    }

    fn task_id(&self, rest: &str) -> Option<String> {
        if !rest.is_empty() {
            return Some(rest.to_string());
        }
        if self.last_task.is_none() {
            render::error("no task id given and nothing submitted yet");
        }
        self.last_task.clone()
    }

    fn wait(&self, task_id: &str) {
        let mut last_progress = -1.0;
        for _ in 0..WAIT_LIMIT {
            match self.client.task(task_id) {
                Ok(task) if task.is_terminal() => {
                    render::task(&task);
                    return;
                }
                Ok(task) => {
                    if task.progress != last_progress {
                        render::progress(&task);
                        last_progress = task.progress;
                    }
                }
                Err(err) => {
                    render::error(&err);
                    return;
                }
            }
            thread::sleep(WAIT_POLL);
        }
        render::error("gave up waiting");
    }
}

fn toggle(current: bool, value: &str) -> Option<bool> {
    if value.is_empty() {
        return Some(!current);
    }
    parse_on_off(value)
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
