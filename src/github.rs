//! GitHub API helpers: posting the coverage check run, keeping a single
//! status comment on the pull request, and listing the files a pull request
//! touches.

use anyhow::{bail, Context as _, Result};
use serde::{Deserialize, Serialize};

use crate::annotate::ChangedFiles;
use crate::model::{check_run_annotations, Annotation, AnnotationLevel, TotalCoverageInfo};
use crate::report::{Conclusion, CHECK_TITLE};

const API_ROOT: &str = "https://api.github.com";
const CHECK_NAME: &str = "Code Coverage";
const COMMENT_MARKER: &str = "<!-- covcheck-comment -->";
/// Identifier carried by status comments from earlier releases of the action.
const LEGACY_COMMENT_MARKER: &str = "513410c6-a258-11ed-a8fc-0242ac120002";

/// The pull request a workflow run belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub head_sha: Option<String>,
    pub html_url: Option<String>,
}

/// Resolved GitHub Actions context, read from environment variables.
pub struct Context {
    token: String,
    repo: String,
    sha: Option<String>,
    git_ref: Option<String>,
    pub pull_request: Option<PullRequest>,
}

#[derive(Deserialize)]
struct EventPayload {
    pull_request: Option<EventPullRequest>,
}

#[derive(Deserialize)]
struct EventPullRequest {
    number: u64,
    html_url: Option<String>,
    head: Option<EventHead>,
}

#[derive(Deserialize)]
struct EventHead {
    sha: Option<String>,
}

impl Context {
    /// Build a context from standard GitHub Actions environment variables
    /// (`GITHUB_TOKEN`, `GITHUB_REPOSITORY`, `GITHUB_SHA`, `GITHUB_REF`,
    /// `GITHUB_EVENT_PATH`). An explicit `token` wins over `GITHUB_TOKEN`.
    pub fn from_env(token: Option<String>) -> Result<Self> {
        let token = match token.filter(|t| !t.is_empty()) {
            Some(t) => t,
            None => std::env::var("GITHUB_TOKEN").context("Missing GitHub token")?,
        };
        let repo = std::env::var("GITHUB_REPOSITORY")
            .context("GITHUB_REPOSITORY environment variable is required")?;
        let sha = std::env::var("GITHUB_SHA").ok();
        let git_ref = std::env::var("GITHUB_REF").ok();

        let pull_request = match std::env::var("GITHUB_EVENT_PATH") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read event payload {path}"))?;
                pull_request_from_event(&raw)?
            }
            Err(_) => None,
        }
        .or_else(|| {
            pr_number_from_ref(git_ref.as_deref()).map(|number| PullRequest {
                number,
                head_sha: None,
                html_url: None,
            })
        });

        Ok(Self {
            token,
            repo,
            sha,
            git_ref,
            pull_request,
        })
    }

    /// The commit the check run is attached to: the pull request head when
    /// there is one, else the workflow's `GITHUB_SHA`.
    pub fn head_sha(&self) -> Option<&str> {
        self.pull_request
            .as_ref()
            .and_then(|pr| pr.head_sha.as_deref())
            .or(self.sha.as_deref())
    }

    /// Where the result is being posted, for log output.
    pub fn link(&self) -> &str {
        self.pull_request
            .as_ref()
            .and_then(|pr| pr.html_url.as_deref())
            .or(self.git_ref.as_deref())
            .unwrap_or(&self.repo)
    }

    /// Create a completed check run carrying the first annotations of
    /// `info`. Returns the new check run's id.
    pub fn create_check_run(&self, info: &TotalCoverageInfo) -> Result<u64> {
        let head_sha = self
            .head_sha()
            .context("could not determine the commit to attach the check run to")?;
        let request = check_run_request(head_sha, info);
        tracing::info!(
            "Posting status '{}' with conclusion '{}' to {} (sha: {})",
            request.status,
            request.conclusion,
            self.link(),
            head_sha
        );

        let url = format!("{API_ROOT}/repos/{}/check-runs", self.repo);
        let resp = send(self.api("POST", &url).send_json(&request), "create check run")?;

        #[derive(Deserialize)]
        struct Created {
            id: u64,
        }
        let created: Created = resp
            .into_json()
            .context("Failed to parse check run response")?;
        Ok(created.id)
    }

    /// Replace the status comment on the pull request: the previous one is
    /// deleted, and a new one linking the check run is posted when coverage
    /// dropped. Does nothing outside a pull request.
    pub fn sync_comment(&self, conclusion: Conclusion, check_id: u64) -> Result<()> {
        let Some(pr) = &self.pull_request else {
            return Ok(());
        };

        if let Some(comment_id) = self.find_existing_comment(pr.number)? {
            let url = format!(
                "{API_ROOT}/repos/{}/issues/comments/{comment_id}",
                self.repo
            );
            send(self.api("DELETE", &url).call(), "delete comment")?;
            tracing::info!("Comment successfully deleted for id: {comment_id}");
        }

        if conclusion == Conclusion::Failure {
            let url = format!(
                "{API_ROOT}/repos/{}/issues/{}/comments",
                self.repo, pr.number
            );
            let body = comment_body(&self.repo, check_id);
            send(
                self.api("POST", &url)
                    .send_json(serde_json::json!({ "body": body })),
                "create comment",
            )?;
            tracing::info!("Comment posted to {}/pull/{}", self.repo, pr.number);
        }
        Ok(())
    }

    /// Find an existing covcheck comment on a PR (by our hidden marker).
    fn find_existing_comment(&self, pr_number: u64) -> Result<Option<u64>> {
        #[derive(Deserialize)]
        struct Comment {
            id: u64,
            body: Option<String>,
        }

        let mut page = 1u32;
        loop {
            let url = format!(
                "{API_ROOT}/repos/{}/issues/{pr_number}/comments?per_page=100&page={page}",
                self.repo
            );
            let comments: Vec<Comment> = send(self.api("GET", &url).call(), "list PR comments")?
                .into_json()
                .context("Failed to parse comments JSON")?;
            if comments.is_empty() {
                return Ok(None);
            }
            if let Some(c) = comments
                .iter()
                .find(|c| c.body.as_deref().is_some_and(is_status_comment))
            {
                return Ok(Some(c.id));
            }
            page += 1;
        }
    }

    fn api(&self, method: &str, url: &str) -> ureq::Request {
        ureq::request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", "covcheck")
            .set("X-GitHub-Api-Version", "2022-11-28")
    }
}

impl ChangedFiles for Context {
    /// Repository paths of every file in the pull request.
    fn changed_files(&self) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct PrFile {
            filename: String,
        }

        let Some(pr) = &self.pull_request else {
            bail!("changed files can only be listed for a pull request");
        };

        let mut files = Vec::new();
        let mut page = 1u32;
        loop {
            let url = format!(
                "{API_ROOT}/repos/{}/pulls/{}/files?per_page=100&page={page}",
                self.repo, pr.number
            );
            let batch: Vec<PrFile> = send(self.api("GET", &url).call(), "list PR files")?
                .into_json()
                .context("Failed to parse PR files JSON")?;
            if batch.is_empty() {
                break;
            }
            files.extend(batch.into_iter().map(|f| f.filename));
            page += 1;
        }
        Ok(files)
    }
}

fn send(
    resp: std::result::Result<ureq::Response, ureq::Error>,
    action: &str,
) -> Result<ureq::Response> {
    match resp {
        Ok(resp) => Ok(resp),
        Err(ureq::Error::Status(code, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            bail!("GitHub API error trying to {action} (HTTP {code}): {body}");
        }
        Err(e) => bail!("Failed to {action}: {e}"),
    }
}

/// Extract PR number from GITHUB_REF (e.g. "refs/pull/42/merge" → 42).
fn pr_number_from_ref(github_ref: Option<&str>) -> Option<u64> {
    let parts: Vec<&str> = github_ref?.split('/').collect();
    if parts.len() >= 3 && parts[0] == "refs" && parts[1] == "pull" {
        parts[2].parse().ok()
    } else {
        None
    }
}

fn pull_request_from_event(raw: &str) -> Result<Option<PullRequest>> {
    let payload: EventPayload =
        serde_json::from_str(raw).context("Failed to parse event payload")?;
    Ok(payload.pull_request.map(|pr| PullRequest {
        number: pr.number,
        head_sha: pr.head.and_then(|h| h.sha),
        html_url: pr.html_url,
    }))
}

fn is_status_comment(body: &str) -> bool {
    body.contains(COMMENT_MARKER) || body.contains(LEGACY_COMMENT_MARKER)
}

fn comment_body(repo: &str, check_id: u64) -> String {
    format!("Uh-oh! Coverage dropped: https://github.com/{repo}/runs/{check_id} {COMMENT_MARKER}")
}

/// Annotation as the check-runs endpoint expects it.
#[derive(Debug, Serialize)]
pub struct CheckRunAnnotation<'a> {
    pub path: &'a str,
    pub start_line: u32,
    pub end_line: u32,
    pub annotation_level: AnnotationLevel,
    pub message: &'a str,
}

impl<'a> From<&'a Annotation> for CheckRunAnnotation<'a> {
    fn from(a: &'a Annotation) -> Self {
        Self {
            path: &a.path,
            start_line: a.start_line,
            end_line: a.end_line,
            annotation_level: a.annotation_level,
            message: &a.message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckRunOutput<'a> {
    pub title: &'static str,
    pub summary: &'static str,
    pub annotations: Vec<CheckRunAnnotation<'a>>,
}

#[derive(Debug, Serialize)]
pub struct CheckRunRequest<'a> {
    pub name: &'static str,
    pub head_sha: &'a str,
    pub status: &'static str,
    pub conclusion: &'static str,
    pub output: CheckRunOutput<'a>,
}

/// Body for `POST /repos/{repo}/check-runs`. Annotations past the API's
/// per-request limit are dropped, keeping the original order.
#[must_use]
pub fn check_run_request<'a>(head_sha: &'a str, info: &'a TotalCoverageInfo) -> CheckRunRequest<'a> {
    let conclusion = Conclusion::of(info);
    CheckRunRequest {
        name: CHECK_NAME,
        head_sha,
        status: "completed",
        conclusion: conclusion.as_str(),
        output: CheckRunOutput {
            title: CHECK_TITLE,
            summary: conclusion.summary(),
            annotations: check_run_annotations(&info.annotations)
                .iter()
                .map(CheckRunAnnotation::from)
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(line: u32) -> Annotation {
        Annotation {
            path: "src/a.ts".to_string(),
            start_line: line,
            end_line: line,
            annotation_level: AnnotationLevel::Failure,
            coverage: 12.5,
            message: format!("Missed coverage on line: {line}"),
        }
    }

    #[test]
    fn test_pr_number_from_ref() {
        assert_eq!(pr_number_from_ref(Some("refs/pull/42/merge")), Some(42));
        assert_eq!(pr_number_from_ref(Some("refs/heads/main")), None);
        assert_eq!(pr_number_from_ref(None), None);
    }

    #[test]
    fn test_pull_request_from_event() {
        let raw = r#"{
            "action": "synchronize",
            "pull_request": {
                "number": 7,
                "html_url": "https://github.com/o/r/pull/7",
                "head": { "sha": "abc123", "ref": "feature" }
            }
        }"#;
        let pr = pull_request_from_event(raw).unwrap().unwrap();
        assert_eq!(pr.number, 7);
        assert_eq!(pr.head_sha.as_deref(), Some("abc123"));
        assert_eq!(pr.html_url.as_deref(), Some("https://github.com/o/r/pull/7"));

        let push = r#"{ "ref": "refs/heads/main" }"#;
        assert!(pull_request_from_event(push).unwrap().is_none());
    }

    #[test]
    fn test_check_run_request() {
        let info = TotalCoverageInfo {
            total_coverage: 12.5,
            annotations: (1..=75).map(annotation).collect(),
        };
        let request = check_run_request("deadbeef", &info);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["name"], "Code Coverage");
        assert_eq!(json["head_sha"], "deadbeef");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["conclusion"], "failure");
        assert_eq!(json["output"]["title"], "Coverage check");
        assert_eq!(json["output"]["summary"], "Coverage dropped");

        let annotations = json["output"]["annotations"].as_array().unwrap();
        assert_eq!(annotations.len(), 50);
        assert_eq!(annotations[0]["start_line"], 1);
        assert_eq!(annotations[49]["start_line"], 50);
        assert_eq!(annotations[0]["annotation_level"], "failure");
        assert!(annotations[0].get("coverage").is_none());
    }

    #[test]
    fn test_check_run_request_success() {
        let info = TotalCoverageInfo::default();
        let json = serde_json::to_value(check_run_request("sha", &info)).unwrap();
        assert_eq!(json["conclusion"], "success");
        assert_eq!(json["output"]["summary"], "Coverage stayed at 100%");
        assert!(json["output"]["annotations"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_comment_body_carries_marker() {
        let body = comment_body("o/r", 99);
        assert!(body.starts_with("Uh-oh! Coverage dropped: https://github.com/o/r/runs/99"));
        assert!(body.contains(COMMENT_MARKER));
        assert!(is_status_comment(&body));
    }

    #[test]
    fn test_status_comment_recognizes_legacy_identifier() {
        let legacy = "Uh-oh! Coverage dropped: https://github.com/o/r/runs/1 \
                      513410c6-a258-11ed-a8fc-0242ac120002";
        assert!(is_status_comment(legacy));
        assert!(!is_status_comment("LGTM"));
    }
}
