//! Log-file tailing: opens the file, seeks to its current end, then polls
//! for newly appended lines and matches each against a regex.

use jobwarden_dispatch::{Attribute, Event, Signal, EMITTER_LOG_FILE};
use regex::Regex;
use std::collections::HashMap;
use std::io::SeekFrom;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::sync::CancellationToken;

pub struct LogFileSource {
    pub job_name: String,
    pub path: String,
    pub line_delimiter: String,
    pub regex: Regex,
    pub poll_interval: Duration,
}

impl LogFileSource {
    pub async fn run(self, signal: Arc<dyn Signal>, cancellation: CancellationToken) {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(_error) => {
                #[cfg(feature = "tracing")]
                tracing::error!(job = %self.job_name, path = %self.path, error = %_error, "failed to open log file");
                return;
            }
        };

        if let Err(_error) = file.seek(SeekFrom::End(0)).await {
            #[cfg(feature = "tracing")]
            tracing::warn!(job = %self.job_name, error = %_error, "error seeking to end of log file");
            return;
        }

        let mut carry = String::new();

        loop {
            let mut buf = String::new();
            match file.read_to_string(&mut buf).await {
                Ok(0) => {}
                Ok(_) => {
                    carry.push_str(&buf);
                    let mut lines: Vec<&str> = carry.split(self.line_delimiter.as_str()).collect();
                    let remainder = lines.pop().unwrap_or("").to_string();
                    for line in lines {
                        self.emit_if_matching(&signal, line);
                    }
                    carry = remainder;
                }
                Err(_error) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!(job = %self.job_name, error = %_error, "error reading log file");
                    return;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = cancellation.cancelled() => return,
            }
        }
    }

    fn emit_if_matching(&self, signal: &Arc<dyn Signal>, line: &str) {
        let Some(captures) = self.regex.captures(line) else {
            return;
        };

        let mut groups = HashMap::new();
        for (index, name) in self.regex.capture_names().enumerate() {
            let Some(matched) = captures.get(index) else {
                continue;
            };
            let key = name.map(str::to_string).unwrap_or_else(|| index.to_string());
            groups.insert(key, Attribute::Str(matched.as_str().to_string()));
        }

        signal.emit(
            Event::new(EMITTER_LOG_FILE)
                .with("file", self.path.clone())
                .with("line", line.to_string())
                .with("groups", Attribute::Map(groups)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobwarden_dispatch::Dispatcher;
    use std::io::Write;
    use tokio::fs::OpenOptions;

    #[tokio::test]
    async fn matches_lines_appended_after_startup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "old line\n").unwrap();

        let dispatcher = Dispatcher::new("job");
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        dispatcher.add_listener(move |event| {
            if let Some(Attribute::Str(line)) = event.attributes.get("line") {
                s.lock().push(line.clone());
            }
        });
        let signal: Arc<dyn Signal> = Arc::new(dispatcher);

        let source = LogFileSource {
            job_name: "job".to_string(),
            path: path.to_string_lossy().to_string(),
            line_delimiter: "\n".to_string(),
            regex: Regex::new("error").unwrap(),
            poll_interval: Duration::from_millis(20),
        };

        let token = CancellationToken::new();
        let handle = tokio::spawn(source.run(signal, token.clone()));

        tokio::time::sleep(Duration::from_millis(30)).await;
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "an error occurred").unwrap();
        drop(file);
        let _ = OpenOptions::new().read(true).open(&path).await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        token.cancel();
        let _ = handle.await;

        assert_eq!(*seen.lock(), vec!["an error occurred".to_string()]);
    }
}
