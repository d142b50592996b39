use super::pattern::{CaptionStyle, EngagementLevel, UserPattern};
use crate::constants::CAPTION_MAX_TOKENS;
use crate::db::prelude::Branch;
use crate::util::openai::CompletionRequest;
use crate::workflow::platform::PlatformTemplate;

#[derive(Debug, Clone, Copy)]
pub struct CaptionContext<'a> {
    pub platform: &'a PlatformTemplate,
    pub branch: &'a Branch,
    pub content: &'a str,
    pub pattern: &'a UserPattern,
    pub previous: &'a [String],
}

fn style_hint(style: CaptionStyle) -> &'static str {
    match style {
        CaptionStyle::Concise => "짧고 간결한 문장을 선호합니다",
        CaptionStyle::Balanced => "적당한 길이의 균형 잡힌 글을 선호합니다",
        CaptionStyle::Detailed => "자세하고 풍부한 설명을 선호합니다",
    }
}

fn engagement_hint(level: EngagementLevel) -> &'static str {
    match level {
        EngagementLevel::High => "공유 활동이 활발하므로 참여를 유도하는 질문을 넣어 주세요",
        EngagementLevel::Medium => "자연스러운 공감 포인트를 한두 개 넣어 주세요",
        EngagementLevel::Low => "부담 없이 읽히는 편안한 어조로 작성해 주세요",
    }
}

fn system_prompt(ctx: &CaptionContext<'_>) -> String {
    let p = ctx.platform;
    let mut out = format!(
        "당신은 {} 게시물 캡션을 쓰는 카피라이터입니다.\n{}\n",
        p.name, p.prompt_guide
    );
    out.push_str(&format!(
        "- 길이: {}~{}자 (최대 {}자)\n- 해시태그: {}~{}개\n",
        p.ideal_length.min, p.ideal_length.max, p.max_length, p.hashtags.min, p.hashtags.max
    ));
    out.push_str(if p.emoji_friendly {
        "- 이모지를 적절히 사용하세요\n"
    } else {
        "- 이모지는 사용하지 마세요\n"
    });
    out.push_str("캡션 본문만 출력하세요.");
    out
}

fn user_prompt(ctx: &CaptionContext<'_>) -> String {
    let pattern = ctx.pattern;
    let mut out = format!("매장: {} ({})\n", ctx.branch.name, ctx.branch.address);
    out.push_str(&format!("원본 리뷰:\n{}\n\n", ctx.content.trim()));

    out.push_str("작성자 성향:\n");
    out.push_str(&format!("- {}\n", style_hint(pattern.style)));
    out.push_str(&format!("- {}\n", engagement_hint(pattern.engagement)));
    if pattern.avg_caption_length > 0.0 {
        out.push_str(&format!(
            "- 평소 캡션 길이 약 {:.0}자, 해시태그 약 {:.1}개\n",
            pattern.avg_caption_length, pattern.avg_hashtags
        ));
    }
    if pattern.uses_emoji {
        out.push_str("- 평소 이모지를 즐겨 씁니다\n");
    }
    if !pattern.favourite_keywords.is_empty() {
        out.push_str(&format!(
            "- 자주 쓰는 키워드: {}\n",
            pattern.favourite_keywords.join(", ")
        ));
    }
    if let Some(rating) = pattern.avg_rating {
        out.push_str(&format!("- 평균 별점: {rating:.1}\n"));
    }

    let previous: Vec<&str> = ctx
        .previous
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    if !previous.is_empty() {
        out.push_str("\n이전 캡션과 표현이 겹치지 않게 작성하세요:\n");
        for caption in previous {
            out.push_str(&format!("- {caption}\n"));
        }
    }

    out
}

pub fn caption_request(ctx: &CaptionContext<'_>) -> CompletionRequest {
    CompletionRequest::new(system_prompt(ctx), user_prompt(ctx), CAPTION_MAX_TOKENS)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::prelude::{AgencyId, BranchId, PlatformId};
    use crate::workflow::platform::PlatformRegistry;

    #[test]
    fn test_caption_request_interpolates_pattern_and_history() {
        let registry = PlatformRegistry::builtin();
        let platform = registry.get(&PlatformId::from("naver")).unwrap();
        let branch = Branch {
            id: BranchId::new_v4(),
            agency_id: AgencyId::new_v4(),
            name: String::from("카페 온도"),
            address: String::from("서울 마포구"),
            industry: None,
            latitude: None,
            longitude: None,
            created_at: chrono::Utc::now(),
        };
        let pattern = UserPattern {
            favourite_keywords: vec![String::from("조용해요")],
            avg_rating: Some(4.5),
            ..UserPattern::default()
        };
        let previous = vec![String::from("지난번 캡션"), String::from("  ")];

        let req = caption_request(&CaptionContext {
            platform,
            branch: &branch,
            content: "커피가 맛있어요",
            pattern: &pattern,
            previous: &previous,
        });

        assert_eq!(req.max_tokens, 800);
        assert!(req.messages[0].content.contains("이모지는 사용하지 마세요"));
        assert!(req.messages[0].content.contains("최대 400자"));

        let user = &req.messages[1].content;
        assert!(user.contains("커피가 맛있어요"));
        assert!(user.contains("조용해요"));
        assert!(user.contains("평균 별점: 4.5"));
        assert!(user.contains("- 지난번 캡션"));
        assert_eq!(user.matches("\n- ").count(), 5);
    }
}
