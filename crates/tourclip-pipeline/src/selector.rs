//! Image selection.
//!
//! Lists longer than the limit are ranked by the model; its answer is
//! mapped back to candidate URLs through explicit resolution tiers so every
//! decision shows up in the logs and metrics.

use std::collections::HashSet;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, info, warn};

use tourclip_genai::{GenAiError, ImageDetail, ImageInput, StructuredRequest};
use tourclip_models::{file_name_from_url, SelectedImageSet};

use crate::metrics;
use crate::services::{ask, LanguageModel};

const SCHEMA_NAME: &str = "selectedImages";

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct SelectionAnswer {
    selected_images: Vec<String>,
}

/// How a model token was mapped to an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    /// Token equals a candidate URL
    Exact,
    /// Candidate contains the token, or the token contains the candidate's file name
    Containment,
    /// Token is a 1-based index into the candidates
    Positional,
    /// Token kept as given
    Passthrough,
    /// Unused candidate added to reach the limit
    TopUp,
}

impl ResolutionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionTier::Exact => "exact",
            ResolutionTier::Containment => "containment",
            ResolutionTier::Positional => "positional",
            ResolutionTier::Passthrough => "passthrough",
            ResolutionTier::TopUp => "top_up",
        }
    }
}

/// One resolved entry of the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Token returned by the model; empty for top-up entries
    pub token: String,
    pub url: String,
    pub tier: ResolutionTier,
}

fn resolve_token(token: &str, candidates: &[String]) -> (String, ResolutionTier) {
    if let Some(url) = candidates.iter().find(|c| c.as_str() == token) {
        return (url.clone(), ResolutionTier::Exact);
    }

    if let Some(url) = candidates.iter().find(|c| {
        let name = file_name_from_url(c);
        c.contains(token) || (!name.is_empty() && token.contains(&name))
    }) {
        return (url.clone(), ResolutionTier::Containment);
    }

    if let Some(url) = token
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1)
        .and_then(|n| candidates.get(n - 1))
    {
        return (url.clone(), ResolutionTier::Positional);
    }

    (token.to_string(), ResolutionTier::Passthrough)
}

/// Map model tokens onto candidates, keeping at most `limit` unique entries.
///
/// When `candidates` has more than `limit` entries the result is topped up
/// from unused candidates in input order, so its length is exactly `limit`.
pub fn resolve_selection(tokens: &[String], candidates: &[String], limit: usize) -> Vec<Resolution> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(limit);

    for token in tokens.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if resolved.len() >= limit {
            break;
        }
        let (url, tier) = resolve_token(token, candidates);
        if seen.insert(url.clone()) {
            resolved.push(Resolution {
                token: token.to_string(),
                url,
                tier,
            });
        }
    }

    if candidates.len() > limit {
        for url in candidates {
            if resolved.len() >= limit {
                break;
            }
            if seen.insert(url.clone()) {
                resolved.push(Resolution {
                    token: String::new(),
                    url: url.clone(),
                    tier: ResolutionTier::TopUp,
                });
            }
        }
    }

    resolved
}

fn selection_prompt(candidates: &[String], tour_name: &str, limit: usize) -> String {
    let listing = candidates
        .iter()
        .enumerate()
        .map(|(i, url)| format!("{}. {}", i + 1, url))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You curate images for short promotional videos of the experience \"{name}\".\n\
         There are {count} candidate images. Pick the best {limit} for a video of {limit} \
         five-second clips.\n\n\
         Prefer a set that tells a varied visual story: different compositions, lighting and \
         subjects, sharp and well-framed shots that animate well, and a natural flow from one \
         scene to the next. Avoid near-duplicate shots.\n\n\
         RULE: do not pick images that show people.\n\n\
         Return the chosen images in order of preference in `selectedImages`, using the exact \
         URLs listed below.\n\n\
         CANDIDATES:\n{listing}\n",
        name = tour_name,
        count = candidates.len(),
        limit = limit,
        listing = listing,
    )
}

/// Chooses which images make it into the video.
pub struct ImageSelector {
    model: Arc<dyn LanguageModel>,
    limit: usize,
}

impl ImageSelector {
    pub fn new(model: Arc<dyn LanguageModel>, limit: usize) -> Self {
        Self { model, limit }
    }

    /// Select up to `limit` images. Never fails; falls back to the first images.
    pub async fn select(&self, candidates: &[String], tour_name: &str) -> SelectedImageSet {
        if candidates.len() <= self.limit {
            debug!("{} candidates within limit, keeping all", candidates.len());
            return SelectedImageSet::new(candidates.iter().cloned(), self.limit);
        }

        match self.rank(candidates, tour_name).await {
            Ok(tokens) => {
                let resolved = resolve_selection(&tokens, candidates, self.limit);
                for r in &resolved {
                    debug!(
                        tier = r.tier.as_str(),
                        token = %r.token,
                        url = %r.url,
                        "Resolved selection entry"
                    );
                    metrics::record_resolution(r.tier.as_str());
                }
                info!(
                    "Model selected {} of {} images",
                    resolved.len(),
                    candidates.len()
                );
                SelectedImageSet::new(resolved.into_iter().map(|r| r.url), self.limit)
            }
            Err(e) => {
                warn!("Image selection failed, using first {}: {}", self.limit, e);
                metrics::record_fallback("selection");
                SelectedImageSet::new(candidates.iter().cloned(), self.limit)
            }
        }
    }

    async fn rank(&self, candidates: &[String], tour_name: &str) -> Result<Vec<String>, GenAiError> {
        let request = StructuredRequest::new(
            selection_prompt(candidates, tour_name, self.limit),
            SCHEMA_NAME,
        )
        .with_images(
            candidates
                .iter()
                .map(|url| ImageInput::new(url.clone(), ImageDetail::High)),
        );

        let answer: SelectionAnswer = ask(self.model.as_ref(), &request).await?;
        if answer.selected_images.iter().all(|t| t.trim().is_empty()) {
            return Err(GenAiError::EmptyResponse);
        }
        Ok(answer.selected_images)
    }
}
