use std::time::Duration;

use crate::error::AppError;
use crate::models::posting::Posting;

/// Max postings listed in a notification body.
const MAX_JOBS_IN_BODY: usize = 10;
/// ntfy rejects bodies over ~4 KB.
const MAX_BODY_BYTES: usize = 4000;
const TRAILER_RESERVE: usize = 32;
const ENTRY_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone)]
pub struct NotifierSettings {
    /// Full topic URL, e.g. https://ntfy.sh/job-alerts
    pub url: String,
    pub priority: String,
    pub tags: String,
    pub timeout: Duration,
    /// Word used in the title ("3 new Python jobs found").
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Pushes a single summary per run to ntfy. Send failures are logged and
/// swallowed.
pub struct Notifier {
    client: reqwest::Client,
    settings: NotifierSettings,
}

impl Notifier {
    pub fn new(settings: NotifierSettings) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { client, settings })
    }

    /// Send one notification for `postings`. Returns whether the server
    /// accepted it; empty input sends nothing.
    pub async fn notify(&self, postings: &[&Posting]) -> bool {
        let Some(notification) = compose(postings, &self.settings.language) else {
            return false;
        };

        match self.send(&notification).await {
            Ok(()) => {
                tracing::info!("Sent: {}", notification.title);
                true
            }
            Err(e) => {
                tracing::error!("Failed to send notification: {e}");
                false
            }
        }
    }

    async fn send(&self, notification: &Notification) -> Result<(), AppError> {
        let resp = self
            .client
            .post(&self.settings.url)
            .header("Title", &notification.title)
            .header("Priority", &self.settings.priority)
            .header("Tags", &self.settings.tags)
            .body(notification.body.clone())
            .send()
            .await?;

        resp.error_for_status()?;
        Ok(())
    }
}

/// Build the title and body for a batch of new postings, or `None` when
/// there is nothing to report.
pub fn compose(postings: &[&Posting], language: &str) -> Option<Notification> {
    if postings.is_empty() {
        return None;
    }

    let count = postings.len();
    let plural = if count == 1 { "" } else { "s" };
    let title = format!("{count} new {} job{plural} found", capitalize(language));

    // Room kept for the "...and N more" line.
    let budget = MAX_BODY_BYTES - TRAILER_RESERVE;
    let mut body = String::new();
    let mut listed = 0;
    for posting in postings.iter().take(MAX_JOBS_IN_BODY) {
        let entry = format_job(posting);
        let sep = if body.is_empty() { 0 } else { ENTRY_SEPARATOR.len() };
        if body.len() + sep + entry.len() > budget {
            break;
        }
        if !body.is_empty() {
            body.push_str(ENTRY_SEPARATOR);
        }
        body.push_str(&entry);
        listed += 1;
    }

    let remaining = count - listed;
    if remaining > 0 {
        if !body.is_empty() {
            body.push_str(ENTRY_SEPARATOR);
        }
        body.push_str(&format!("...and {remaining} more"));
    }

    Some(Notification { title, body })
}

fn format_job(posting: &Posting) -> String {
    let title = posting.title.as_deref().unwrap_or("N/A");
    let company = posting.company.as_deref().unwrap_or("N/A");
    let label = location_label(posting);

    let mut line = format!("• {title} @ {company} ({label})");
    let url = posting.job_url();
    if !url.is_empty() && url != "nan" {
        line.push_str(&format!("\n  {url}"));
    }
    line
}

fn location_label(posting: &Posting) -> &str {
    if posting.is_remote.is_true() {
        return "Remote";
    }
    match posting.location() {
        "" => "Unknown location",
        location => location,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::posting::IsRemote;

    fn posting(i: usize) -> Posting {
        Posting {
            title: Some(format!("Python Engineer {i}")),
            company: Some("Acme".into()),
            location: Some("Austin, TX".into()),
            is_remote: IsRemote::False,
            job_url: Some(format!("https://jobs.example/{i}")),
            ..Default::default()
        }
    }

    #[test]
    fn twelve_postings_list_ten_and_a_tail() {
        let postings: Vec<Posting> = (1..=12).map(posting).collect();
        let refs: Vec<&Posting> = postings.iter().collect();
        let n = compose(&refs, "python").unwrap();

        assert_eq!(n.title, "12 new Python jobs found");
        assert_eq!(n.body.matches("• ").count(), 10);
        assert!(n.body.contains("Python Engineer 10 @ Acme"));
        assert!(!n.body.contains("Python Engineer 11 @"));
        assert!(n.body.ends_with("\n\n...and 2 more"));
    }

    #[test]
    fn single_posting_title_and_format() {
        let p = posting(1);
        let n = compose(&[&p], "python").unwrap();
        assert_eq!(n.title, "1 new Python job found");
        assert_eq!(
            n.body,
            "• Python Engineer 1 @ Acme (Austin, TX)\n  https://jobs.example/1"
        );
    }

    #[test]
    fn location_label_fallbacks() {
        let remote = Posting {
            is_remote: IsRemote::True,
            ..posting(1)
        };
        assert_eq!(location_label(&remote), "Remote");

        let nowhere = Posting {
            location: None,
            is_remote: IsRemote::Unknown,
            job_url: Some("nan".into()),
            ..posting(2)
        };
        assert_eq!(location_label(&nowhere), "Unknown location");
        assert!(!format_job(&nowhere).contains('\n'));
    }

    #[test]
    fn empty_input_composes_nothing() {
        assert_eq!(compose(&[], "python"), None);
    }

    #[test]
    fn body_is_bounded() {
        let long = Posting {
            title: Some("é".repeat(800)),
            ..posting(1)
        };
        let postings = vec![long; 10];
        let refs: Vec<&Posting> = postings.iter().collect();
        let n = compose(&refs, "python").unwrap();
        assert!(n.body.len() <= MAX_BODY_BYTES);
    }

    #[test]
    fn long_entries_are_dropped_whole_and_counted_in_tail() {
        let postings: Vec<Posting> = (1..=12)
            .map(|i| Posting {
                title: Some("x".repeat(450)),
                location: None,
                ..posting(i)
            })
            .collect();
        let refs: Vec<&Posting> = postings.iter().collect();
        let n = compose(&refs, "python").unwrap();

        assert!(n.body.len() <= MAX_BODY_BYTES);
        let listed = n.body.matches("• ").count();
        assert!(listed > 0 && listed < MAX_JOBS_IN_BODY);
        assert!(n.body.ends_with(&format!("\n\n...and {} more", 12 - listed)));

        let blocks: Vec<&str> = n.body.split("\n\n").collect();
        assert_eq!(blocks.len(), listed + 1);
        for (i, block) in blocks[..listed].iter().enumerate() {
            assert!(block.starts_with("• "));
            assert!(block.ends_with(&format!("(Unknown location)\n  https://jobs.example/{}", i + 1)));
        }
    }

    #[tokio::test]
    async fn sends_post_with_ntfy_headers() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                    let len = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + len {
                        break;
                    }
                }
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await
                .unwrap();
            String::from_utf8(buf).unwrap()
        });

        let notifier = Notifier::new(NotifierSettings {
            url: format!("http://{addr}/topic"),
            priority: "high".into(),
            tags: "snake,briefcase".into(),
            timeout: Duration::from_secs(5),
            language: "python".into(),
        })
        .unwrap();
        let p = posting(1);
        assert!(notifier.notify(&[&p]).await);

        let request = server.await.unwrap();
        let (head, body) = request.split_once("\r\n\r\n").unwrap();
        let mut lines = head.lines();
        assert_eq!(lines.next(), Some("POST /topic HTTP/1.1"));

        let header = |name: &str| {
            head.lines().skip(1).find_map(|l| {
                let (k, v) = l.split_once(':')?;
                k.eq_ignore_ascii_case(name).then(|| v.trim().to_string())
            })
        };
        assert_eq!(header("title").as_deref(), Some("1 new Python job found"));
        assert_eq!(header("priority").as_deref(), Some("high"));
        assert_eq!(header("tags").as_deref(), Some("snake,briefcase"));
        assert_eq!(body, compose(&[&p], "python").unwrap().body);
    }

    #[tokio::test]
    async fn send_failure_is_swallowed() {
        let notifier = Notifier::new(NotifierSettings {
            url: "http://127.0.0.1:9/topic".into(),
            priority: "default".into(),
            tags: "snake".into(),
            timeout: Duration::from_secs(2),
            language: "python".into(),
        })
        .unwrap();
        let p = posting(1);
        assert!(!notifier.notify(&[&p]).await);
        assert!(!notifier.notify(&[]).await);
    }
}
