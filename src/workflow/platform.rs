//! Declarative platform templates and the caption formatting / share dispatch built on them.
//!
//! Built-in templates cover the launch platforms. Rows in the `platform` table are applied over
//! them at startup: a row's JSON `template` replaces (or adds) the template for that id and its
//! `default_points` replaces the reward.

use std::collections::HashSet;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::PgResult;
use crate::db::prelude::{Branch, PlatformId, PlatformRow, Store};
use crate::util::{char_len, truncate_chars};
use crate::workflow::caption::scores::count_hashtags;

const DEEPLINK_APP_NAME: &str = "reviewhub";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShareMethod {
    Deeplink,
    WebShare,
    CopyOnly,
}

/// Inclusive `min..=max` bound on a count of chars or hashtags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: usize,
    pub max: usize,
}

impl Bounds {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, n: usize) -> bool {
        (self.min..=self.max).contains(&n)
    }
}

/// Scheme URL plus query parameter templates.
///
/// Parameter values may use `{name}`, `{lat}`, `{lng}`, `{address}` and `{query}`; a parameter
/// whose rendered value is empty is left out of the URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeeplinkSpec {
    pub base_url: String,
    pub params: Vec<(String, String)>,
}

impl DeeplinkSpec {
    pub fn build(&self, branch: &Branch) -> Option<String> {
        let params: Vec<(String, String)> = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), render_placeholders(v, branch)))
            .filter(|(_, v)| !v.is_empty())
            .collect();

        Url::parse_with_params(&self.base_url, &params)
            .inspect_err(|e| tracing::warn!(error = ?e, base = self.base_url, "bad deeplink base url"))
            .ok()
            .map(String::from)
    }
}

fn render_placeholders(value: &str, branch: &Branch) -> String {
    let coord = |c: Option<f64>| c.map(|c| c.to_string()).unwrap_or_default();

    value
        .replace("{name}", &branch.name)
        .replace("{lat}", &coord(branch.latitude))
        .replace("{lng}", &coord(branch.longitude))
        .replace("{address}", &branch.address)
        .replace("{query}", &format!("{} {}", branch.name, branch.address))
        .trim()
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformTemplate {
    pub id: PlatformId,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub instructions: Vec<String>,
    pub share_method: ShareMethod,
    pub deeplink: Option<DeeplinkSpec>,
    pub share_url: Option<String>,
    pub max_length: usize,
    pub ideal_length: Bounds,
    pub hashtags: Bounds,
    pub default_hashtags: Vec<String>,
    pub emoji_friendly: bool,
    pub prompt_guide: String,
    pub default_points: i32,
}

impl Default for PlatformTemplate {
    fn default() -> Self {
        Self {
            id: PlatformId::from(""),
            name: String::new(),
            icon: String::new(),
            color: String::from("#888888"),
            instructions: Vec::new(),
            share_method: ShareMethod::CopyOnly,
            deeplink: None,
            share_url: None,
            max_length: 2000,
            ideal_length: Bounds::new(50, 500),
            hashtags: Bounds::new(0, 5),
            default_hashtags: Vec::new(),
            emoji_friendly: true,
            prompt_guide: String::new(),
            default_points: 50,
        }
    }
}

/// What a client does to hand the caption over to the platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum DistributionAction {
    Deeplink {
        url: String,
        fallback_text: String,
    },
    WebShare {
        title: String,
        text: String,
        url: Option<String>,
        fallback_text: String,
    },
    CopyOnly {
        text: String,
    },
}

impl DistributionAction {
    /// Text copied to the clipboard when the share route is unavailable.
    pub fn fallback_text(&self) -> &str {
        match self {
            DistributionAction::Deeplink { fallback_text, .. }
            | DistributionAction::WebShare { fallback_text, .. } => fallback_text,
            DistributionAction::CopyOnly { text } => text,
        }
    }
}

fn normalize_tag(raw: &str) -> String {
    raw.trim_start_matches('#')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

impl PlatformTemplate {
    /// Fits `text` under `max_length` and appends hashtags built from the defaults, the branch
    /// name, and the keywords. Tags already in the text count against the hashtag maximum.
    pub fn format_caption(&self, text: &str, branch_name: &str, keywords: &[String]) -> String {
        let text = text.trim();
        let mut seen: HashSet<String> = HashSet::new();
        let budget = self.hashtags.max.saturating_sub(count_hashtags(text));
        let lowered = text.to_lowercase();

        let tags: Vec<String> = self
            .default_hashtags
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(branch_name))
            .chain(keywords.iter().map(String::as_str))
            .map(normalize_tag)
            .filter(|t| !t.is_empty())
            .filter(|t| !lowered.contains(&format!("#{}", t.to_lowercase())))
            .filter(|t| seen.insert(t.to_lowercase()))
            .take(budget)
            .map(|t| format!("#{t}"))
            .collect();

        if tags.is_empty() {
            return truncate_chars(text, self.max_length);
        }

        let line = tags.join(" ");
        let body_budget = self.max_length.saturating_sub(char_len(&line) + 2);
        if body_budget == 0 {
            return truncate_chars(&line, self.max_length);
        }

        format!("{}\n\n{line}", truncate_chars(text, body_budget))
    }

    pub fn distribution_action(&self, caption: &str, branch: &Branch) -> DistributionAction {
        match self.share_method {
            ShareMethod::Deeplink => match self.deeplink.as_ref().and_then(|d| d.build(branch)) {
                Some(url) => DistributionAction::Deeplink {
                    url,
                    fallback_text: caption.to_string(),
                },
                None => DistributionAction::CopyOnly {
                    text: caption.to_string(),
                },
            },
            ShareMethod::WebShare => DistributionAction::WebShare {
                title: format!("{} 후기", branch.name),
                text: caption.to_string(),
                url: self.share_url.clone(),
                fallback_text: caption.to_string(),
            },
            ShareMethod::CopyOnly => DistributionAction::CopyOnly {
                text: caption.to_string(),
            },
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn builtin_templates() -> Vec<PlatformTemplate> {
    vec![
        PlatformTemplate {
            id: PlatformId::from("naver"),
            name: String::from("네이버 플레이스"),
            icon: String::from("naver"),
            color: String::from("#03C75A"),
            instructions: strings(&[
                "리뷰 텍스트를 복사하세요",
                "네이버 지도 앱에서 매장 페이지가 열립니다",
                "'리뷰 쓰기'를 눌러 붙여넣기 하세요",
            ]),
            share_method: ShareMethod::Deeplink,
            deeplink: Some(DeeplinkSpec {
                base_url: String::from("nmap://place"),
                params: vec![
                    (String::from("lat"), String::from("{lat}")),
                    (String::from("lng"), String::from("{lng}")),
                    (String::from("name"), String::from("{name}")),
                    (String::from("appname"), String::from(DEEPLINK_APP_NAME)),
                ],
            }),
            share_url: None,
            max_length: 400,
            ideal_length: Bounds::new(100, 300),
            hashtags: Bounds::new(0, 3),
            default_hashtags: Vec::new(),
            emoji_friendly: false,
            prompt_guide: String::from(
                "네이버 플레이스 리뷰: 방문 경험을 구체적이고 정보 위주로, 이모지 없이 담백하게 작성",
            ),
            default_points: 100,
        },
        PlatformTemplate {
            id: PlatformId::from("instagram"),
            name: String::from("Instagram"),
            icon: String::from("instagram"),
            color: String::from("#E4405F"),
            instructions: strings(&[
                "캡션이 클립보드에 복사됩니다",
                "공유 시트에서 Instagram을 선택하세요",
                "사진을 고르고 캡션을 붙여넣으세요",
            ]),
            share_method: ShareMethod::WebShare,
            deeplink: None,
            share_url: None,
            max_length: 2200,
            ideal_length: Bounds::new(100, 300),
            hashtags: Bounds::new(5, 15),
            default_hashtags: strings(&["맛집", "일상"]),
            emoji_friendly: true,
            prompt_guide: String::from(
                "Instagram 캡션: 감성적인 첫 문장, 짧은 줄바꿈, 이모지를 적절히 사용하고 질문으로 마무리",
            ),
            default_points: 100,
        },
        PlatformTemplate {
            id: PlatformId::from("xiaohongshu"),
            name: String::from("小红书"),
            icon: String::from("xiaohongshu"),
            color: String::from("#FE2C55"),
            instructions: strings(&[
                "캡션을 복사하세요",
                "小红书 앱에서 새 노트를 작성하세요",
                "사진과 함께 캡션을 붙여넣으세요",
            ]),
            share_method: ShareMethod::CopyOnly,
            deeplink: None,
            share_url: None,
            max_length: 1000,
            ideal_length: Bounds::new(200, 600),
            hashtags: Bounds::new(3, 10),
            default_hashtags: strings(&["韩国探店", "首尔美食"]),
            emoji_friendly: true,
            prompt_guide: String::from(
                "小红书 노트: 제목 한 줄, 항목별 정리, 이모지 풍부, 중국어 여행자에게 유용한 팁 포함",
            ),
            default_points: 150,
        },
        PlatformTemplate {
            id: PlatformId::from("kakao"),
            name: String::from("카카오톡"),
            icon: String::from("kakao"),
            color: String::from("#FEE500"),
            instructions: strings(&[
                "공유 시트에서 카카오톡을 선택하세요",
                "친구나 채팅방을 골라 보내세요",
            ]),
            share_method: ShareMethod::WebShare,
            deeplink: None,
            share_url: None,
            max_length: 500,
            ideal_length: Bounds::new(50, 200),
            hashtags: Bounds::new(0, 3),
            default_hashtags: Vec::new(),
            emoji_friendly: true,
            prompt_guide: String::from("카카오톡 공유: 친구에게 추천하듯 짧고 친근한 말투"),
            default_points: 50,
        },
        PlatformTemplate {
            id: PlatformId::from("facebook"),
            name: String::from("Facebook"),
            icon: String::from("facebook"),
            color: String::from("#1877F2"),
            instructions: strings(&[
                "공유 시트에서 Facebook을 선택하세요",
                "캡션을 확인하고 게시하세요",
            ]),
            share_method: ShareMethod::WebShare,
            deeplink: None,
            share_url: None,
            max_length: 5000,
            ideal_length: Bounds::new(40, 250),
            hashtags: Bounds::new(1, 3),
            default_hashtags: Vec::new(),
            emoji_friendly: true,
            prompt_guide: String::from("Facebook 게시물: 이야기하듯 자연스럽게, 해시태그는 최소한으로"),
            default_points: 50,
        },
    ]
}

/// Platform templates in display order.
#[derive(Debug, Clone)]
pub struct PlatformRegistry {
    templates: Vec<PlatformTemplate>,
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PlatformRegistry {
    pub fn builtin() -> Self {
        Self {
            templates: builtin_templates(),
        }
    }

    /// Built-ins with the catalog rows applied on top.
    #[instrument(skip(store))]
    pub async fn load(store: &dyn Store) -> PgResult<Self> {
        let rows = store.platforms().await?;
        let registry = Self::builtin().with_overrides(rows);

        tracing::info!(count = registry.templates.len(), "platform registry loaded");
        Ok(registry)
    }

    pub fn with_overrides(mut self, rows: Vec<PlatformRow>) -> Self {
        for row in rows {
            let template = match row.template {
                Some(json) => match serde_json::from_value::<PlatformTemplate>(json.0) {
                    Ok(mut t) => {
                        t.id = row.id.clone();
                        if t.name.is_empty() {
                            t.name = row.name.clone();
                        }
                        Some(t)
                    }
                    Err(e) => {
                        tracing::warn!(error = ?e, platform = %row.id, "ignoring malformed platform template");
                        None
                    }
                },
                None => None,
            };

            let position = self.templates.iter().position(|t| t.id == row.id);
            match (template, position) {
                (Some(mut t), Some(i)) => {
                    t.default_points = row.default_points;
                    self.templates[i] = t;
                }
                (Some(mut t), None) => {
                    t.default_points = row.default_points;
                    self.templates.push(t);
                }
                (None, Some(i)) => self.templates[i].default_points = row.default_points,
                (None, None) => {
                    tracing::warn!(platform = %row.id, "catalog row has no template and no built-in");
                }
            }
        }

        self
    }

    pub fn get(&self, id: &PlatformId) -> Option<&PlatformTemplate> {
        self.templates.iter().find(|t| &t.id == id)
    }

    pub fn list(&self) -> &[PlatformTemplate] {
        &self.templates
    }

    pub fn reward(&self, id: &PlatformId) -> Option<i32> {
        self.get(id).map(|t| t.default_points)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::prelude::{AgencyId, BranchId};
    use serde_json::json;
    use sqlx::types::Json;

    fn branch(lat: Option<f64>) -> Branch {
        Branch {
            id: BranchId::new_v4(),
            agency_id: AgencyId::new_v4(),
            name: String::from("카페 온도"),
            address: String::from("서울 마포구 양화로 1"),
            industry: None,
            latitude: lat,
            longitude: lat.map(|_| 126.92),
            created_at: chrono::Utc::now(),
        }
    }

    fn template(id: &str) -> PlatformTemplate {
        PlatformRegistry::builtin()
            .get(&PlatformId::from(id))
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_builtins_share_methods() {
        let registry = PlatformRegistry::builtin();
        let methods: Vec<_> = registry
            .list()
            .iter()
            .map(|t| (t.id.as_str().to_string(), t.share_method))
            .collect();

        assert_eq!(
            methods,
            vec![
                (String::from("naver"), ShareMethod::Deeplink),
                (String::from("instagram"), ShareMethod::WebShare),
                (String::from("xiaohongshu"), ShareMethod::CopyOnly),
                (String::from("kakao"), ShareMethod::WebShare),
                (String::from("facebook"), ShareMethod::WebShare),
            ]
        );
    }

    #[test]
    fn test_naver_deeplink_url() {
        let action = template("naver").distribution_action("좋아요", &branch(Some(37.55)));
        let DistributionAction::Deeplink { url, fallback_text } = action else {
            panic!("expected deeplink");
        };

        assert!(url.starts_with("nmap://place?"));
        assert!(url.contains("lat=37.55"));
        assert!(url.contains("lng=126.92"));
        assert!(url.contains("appname=reviewhub"));
        assert_eq!(fallback_text, "좋아요");
    }

    #[test]
    fn test_deeplink_skips_missing_coordinates() {
        let action = template("naver").distribution_action("좋아요", &branch(None));
        let DistributionAction::Deeplink { url, .. } = action else {
            panic!("expected deeplink");
        };

        assert!(!url.contains("lat="));
        assert!(url.contains("name="));
    }

    #[test]
    fn test_copy_only_and_web_share() {
        let b = branch(None);
        assert_eq!(
            template("xiaohongshu").distribution_action("好吃", &b),
            DistributionAction::CopyOnly {
                text: String::from("好吃")
            }
        );

        let share = template("instagram").distribution_action("caption", &b);
        assert_eq!(share.fallback_text(), "caption");
        assert!(matches!(share, DistributionAction::WebShare { .. }));
    }

    #[test]
    fn test_format_caption_appends_deduplicated_hashtags() {
        let keywords = vec![String::from("맛집"), String::from("분위기 좋음")];
        let out = template("instagram").format_caption("오늘의 커피", "카페 온도", &keywords);

        assert_eq!(out, "오늘의 커피\n\n#맛집 #일상 #카페온도 #분위기좋음");
    }

    #[test]
    fn test_format_caption_respects_limits() {
        let naver = template("naver");
        let long = "가".repeat(1000);
        let keywords: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();

        let out = naver.format_caption(&long, "지점", &keywords);
        assert!(char_len(&out) <= naver.max_length);
        assert_eq!(count_hashtags(&out), naver.hashtags.max);
        assert!(out.contains('…'));
    }

    #[test]
    fn test_format_caption_counts_existing_tags() {
        let kakao = template("kakao");
        let out = kakao.format_caption("#하나 #둘 좋아요", "지점", &[String::from("셋")]);

        assert_eq!(count_hashtags(&out), 3);
        assert!(out.ends_with("#지점"));
    }

    #[test]
    fn test_overrides_replace_and_add() {
        let rows = vec![
            PlatformRow {
                id: PlatformId::from("kakao"),
                name: String::from("카카오톡"),
                default_points: 70,
                template: None,
            },
            PlatformRow {
                id: PlatformId::from("threads"),
                name: String::from("Threads"),
                default_points: 30,
                template: Some(Json(json!({
                    "share_method": "web-share",
                    "max_length": 500,
                    "hashtags": { "min": 0, "max": 1 }
                }))),
            },
            PlatformRow {
                id: PlatformId::from("instagram"),
                name: String::from("Instagram"),
                default_points: 10,
                template: Some(Json(json!({ "share_method": 42 }))),
            },
        ];

        let registry = PlatformRegistry::builtin().with_overrides(rows);

        assert_eq!(registry.reward(&PlatformId::from("kakao")), Some(70));
        assert_eq!(registry.reward(&PlatformId::from("instagram")), Some(10));
        assert_eq!(
            registry.get(&PlatformId::from("instagram")).unwrap().share_method,
            ShareMethod::WebShare
        );

        let threads = registry.get(&PlatformId::from("threads")).unwrap();
        assert_eq!(threads.name, "Threads");
        assert_eq!(threads.max_length, 500);
        assert_eq!(threads.default_points, 30);
        assert_eq!(registry.list().len(), 6);
    }
}
