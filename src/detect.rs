use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub elements: Vec<PageElement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageElement {
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub text: String,
}

impl PageSnapshot {
    pub fn path(&self) -> &str {
        let rest = self.url.split_once("://").map_or(self.url.as_str(), |(_, rest)| rest);
        let path = rest.find('/').map_or("/", |start| &rest[start..]);
        path.split(['?', '#']).next().unwrap_or("/")
    }

    pub fn host(&self) -> &str {
        let rest = self.url.split_once("://").map_or(self.url.as_str(), |(_, rest)| rest);
        let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
        let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
        host.split(':').next().unwrap_or("")
    }

    fn elements_with_class<'a>(&'a self, needles: &'a [&str]) -> impl Iterator<Item = &'a PageElement> {
        self.elements.iter().filter(move |element| {
            let class = element.class.to_lowercase();
            needles.iter().any(|needle| class.contains(needle))
        })
    }
}

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("page is not on {0}")]
    UnsupportedPage(String),
    #[error("unreadable count '{0}'")]
    Unreadable(String),
}

pub trait ProblemDetector: Send + Sync {
    fn name(&self) -> &'static str;

    fn detect(&self, page: &PageSnapshot) -> Result<u64, DetectError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    ProblemPage,
    ProfilePage,
    SubmissionsPage,
    GeneralDetection,
}

impl DetectionMethod {
    pub fn classify(page: &PageSnapshot) -> Self {
        let path = page.path();
        if is_problem_page(path) {
            Self::ProblemPage
        } else if path.contains("/profile/") {
            Self::ProfilePage
        } else if path.contains("/submissions/") {
            Self::SubmissionsPage
        } else {
            Self::GeneralDetection
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub count: u64,
    pub method: DetectionMethod,
}

fn is_problem_page(path: &str) -> bool {
    path.contains("/problems/") && !path.contains("/submissions")
}

fn mentions_solved(text: &str) -> bool {
    let text = text.to_lowercase();
    text.contains("accepted") || text.contains("solved")
}

pub struct ProblemPageDetector;

impl ProblemDetector for ProblemPageDetector {
    fn name(&self) -> &'static str {
        "problem_page"
    }

    fn detect(&self, page: &PageSnapshot) -> Result<u64, DetectError> {
        if !is_problem_page(page.path()) {
            return Ok(0);
        }
        if mentions_solved(&page.text) {
            return Ok(1);
        }
        let solved = page
            .elements_with_class(&["status", "result"])
            .any(|element| mentions_solved(&element.text));
        Ok(u64::from(solved))
    }
}

pub struct ProfilePageDetector;

impl ProblemDetector for ProfilePageDetector {
    fn name(&self) -> &'static str {
        "profile_page"
    }

    fn detect(&self, page: &PageSnapshot) -> Result<u64, DetectError> {
        let path = page.path();
        if !path.contains("/profile/") && !path.contains("/submissions/") {
            return Ok(0);
        }
        for element in page.elements_with_class(&["solved", "accepted", "count"]) {
            if let Some(digits) = first_number(&element.text) {
                return digits
                    .parse()
                    .map_err(|_| DetectError::Unreadable(digits.to_string()));
            }
        }
        Ok(0)
    }
}

pub struct RecentSubmissionsDetector;

impl ProblemDetector for RecentSubmissionsDetector {
    fn name(&self) -> &'static str {
        "recent_submissions"
    }

    fn detect(&self, page: &PageSnapshot) -> Result<u64, DetectError> {
        let count = page
            .elements_with_class(&["submission", "recent"])
            .filter(|element| mentions_solved(&element.text))
            .count();
        Ok(count as u64)
    }
}

fn first_number(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    Some(&rest[..end])
}

pub struct DetectorChain {
    host: String,
    detectors: Vec<Box<dyn ProblemDetector>>,
}

impl DetectorChain {
    pub fn new(host: impl Into<String>, detectors: Vec<Box<dyn ProblemDetector>>) -> Self {
        Self {
            host: host.into(),
            detectors,
        }
    }

    pub fn standard(host: impl Into<String>) -> Self {
        Self::new(
            host,
            vec![
                Box::new(ProblemPageDetector),
                Box::new(ProfilePageDetector),
                Box::new(RecentSubmissionsDetector),
            ],
        )
    }

    pub fn supports(&self, page: &PageSnapshot) -> bool {
        let host = page.host().to_lowercase();
        host == self.host || host.ends_with(&format!(".{}", self.host))
    }

    /// Fails only for pages outside the tracked host. A detector that errors
    /// counts as zero.
    pub fn detect(&self, page: &PageSnapshot) -> Result<Detection, DetectError> {
        if !self.supports(page) {
            return Err(DetectError::UnsupportedPage(self.host.clone()));
        }
        let mut count = 0;
        for detector in &self.detectors {
            match detector.detect(page) {
                Ok(0) => {}
                Ok(found) => {
                    debug!(detector = detector.name(), found, "detector matched");
                    count = found;
                    break;
                }
                Err(err) => warn!(detector = detector.name(), "detection failed: {err}"),
            }
        }
        Ok(Detection {
            count,
            method: DetectionMethod::classify(page),
        })
    }
}
