//! First-draft generation for a submitted review.

use serde::Serialize;
use tracing::instrument;

use crate::constants::DRAFT_MAX_TOKENS;
use crate::db::prelude::{Branch, Rating};
use crate::util::openai::{Completer, CompletionRequest};

const DRAFT_SYSTEM_PROMPT: &str = "당신은 방문 후기를 작성하는 고객입니다. \
    실제 방문객처럼 자연스럽고 진솔한 한국어 리뷰를 3~5문장으로 작성하세요. \
    과장된 광고 문구나 해시태그는 사용하지 마세요.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Draft {
    pub text: String,
    pub fallback: bool,
}

/// Template used whenever the completion call fails.
pub fn fallback_draft(branch_name: &str, keywords: &[String]) -> String {
    format!(
        "이번에 {branch_name}에 방문했는데 {}가 특히 인상적이었습니다. 좋은 경험이었어요!",
        keywords.join(", ")
    )
}

pub fn draft_request(branch: &Branch, rating: Rating, keywords: &[String]) -> CompletionRequest {
    let mut user = format!("매장명: {}\n", branch.name);
    if let Some(industry) = branch.industry.as_deref().filter(|i| !i.is_empty()) {
        user.push_str(&format!("업종: {industry}\n"));
    }
    user.push_str(&format!("주소: {}\n", branch.address));
    user.push_str(&format!("별점: {} / 5\n", rating.value()));
    user.push_str(&format!("키워드: {}\n\n", keywords.join(", ")));
    user.push_str("위 정보를 바탕으로 리뷰를 작성해 주세요.");

    CompletionRequest::new(DRAFT_SYSTEM_PROMPT, user, DRAFT_MAX_TOKENS)
}

#[instrument(skip(completer, branch, keywords), fields(branch = %branch.id))]
pub async fn generate_draft(
    completer: &dyn Completer,
    branch: &Branch,
    rating: Rating,
    keywords: &[String],
) -> Draft {
    match completer.complete(&draft_request(branch, rating, keywords)).await {
        Ok(text) => Draft {
            text: text.trim().to_string(),
            fallback: false,
        },
        Err(e) => {
            tracing::warn!(error = ?e, "draft completion failed, using fallback template");
            Draft {
                text: fallback_draft(&branch.name, keywords),
                fallback: true,
            }
        }
    }
}
