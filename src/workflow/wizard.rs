use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::prelude::{Rating, Review};

/// Wizard steps in the order a reviewer walks through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    Capture,
    Rate,
    Keywords,
    Generate,
    Publish,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Capture,
        WizardStep::Rate,
        WizardStep::Keywords,
        WizardStep::Generate,
        WizardStep::Publish,
    ];

    /// The field a step fills in before the next one opens.
    pub fn produces(self) -> MissingField {
        match self {
            WizardStep::Capture => MissingField::Media,
            WizardStep::Rate => MissingField::Rating,
            WizardStep::Keywords => MissingField::Keywords,
            WizardStep::Generate => MissingField::Draft,
            WizardStep::Publish => MissingField::Platform,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingField {
    Media,
    Rating,
    Keywords,
    Draft,
    Platform,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissingField::Media => "media",
            MissingField::Rating => "rating",
            MissingField::Keywords => "keywords",
            MissingField::Draft => "draft",
            MissingField::Platform => "platform",
        };

        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("missing required field: {0}")]
    Missing(MissingField),
}

/// Snapshot of what a reviewer has filled in so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewWizard {
    pub media: usize,
    pub rating: Option<Rating>,
    pub keywords: usize,
    pub has_draft: bool,
    pub platforms: usize,
}

impl ReviewWizard {
    pub fn from_review(review: &Review) -> Self {
        Self {
            media: review.media_urls.len(),
            rating: Some(review.rating),
            keywords: review.keywords.len(),
            has_draft: review.has_draft(),
            platforms: 0,
        }
    }

    pub fn with_platforms(mut self, platforms: usize) -> Self {
        self.platforms = platforms;
        self
    }

    fn is_filled(&self, field: MissingField) -> bool {
        match field {
            MissingField::Media => self.media > 0,
            MissingField::Rating => self.rating.is_some(),
            MissingField::Keywords => self.keywords > 0,
            MissingField::Draft => self.has_draft,
            MissingField::Platform => self.platforms > 0,
        }
    }

    /// First step whose field is still empty. A fully filled wizard stays on `Publish`.
    pub fn current_step(&self) -> WizardStep {
        WizardStep::ALL
            .into_iter()
            .find(|step| !self.is_filled(step.produces()))
            .unwrap_or(WizardStep::Publish)
    }

    /// Fails with the first empty field among the steps that gate `step`.
    pub fn require(&self, step: WizardStep) -> Result<(), WizardError> {
        WizardStep::ALL
            .into_iter()
            .take_while(|s| *s < step)
            .map(WizardStep::produces)
            .find(|field| !self.is_filled(*field))
            .map_or(Ok(()), |field| Err(WizardError::Missing(field)))
    }

    /// Every step including the platform choice on `Publish`.
    pub fn require_complete(&self) -> Result<(), WizardError> {
        self.require(WizardStep::Publish)?;
        if self.is_filled(MissingField::Platform) {
            Ok(())
        } else {
            Err(WizardError::Missing(MissingField::Platform))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn filled() -> ReviewWizard {
        ReviewWizard {
            media: 1,
            rating: Some(Rating::try_from(4).unwrap()),
            keywords: 2,
            has_draft: true,
            platforms: 1,
        }
    }

    #[test]
    fn test_current_step_walks_forward() {
        let mut wizard = ReviewWizard::default();
        assert_eq!(wizard.current_step(), WizardStep::Capture);

        wizard.media = 2;
        assert_eq!(wizard.current_step(), WizardStep::Rate);

        wizard.rating = Some(Rating::try_from(5).unwrap());
        assert_eq!(wizard.current_step(), WizardStep::Keywords);

        wizard.keywords = 1;
        assert_eq!(wizard.current_step(), WizardStep::Generate);

        wizard.has_draft = true;
        assert_eq!(wizard.current_step(), WizardStep::Publish);
        assert_eq!(filled().current_step(), WizardStep::Publish);
    }

    #[test]
    fn test_require_reports_first_missing_field() {
        let wizard = ReviewWizard {
            media: 0,
            keywords: 0,
            ..filled()
        };

        assert_eq!(wizard.require(WizardStep::Capture), Ok(()));
        assert_eq!(
            wizard.require(WizardStep::Generate),
            Err(WizardError::Missing(MissingField::Media))
        );
    }

    #[test]
    fn test_require_generate_ignores_later_fields() {
        let wizard = ReviewWizard {
            has_draft: false,
            platforms: 0,
            ..filled()
        };

        assert!(wizard.require(WizardStep::Generate).is_ok());
        assert_eq!(
            wizard.require(WizardStep::Publish),
            Err(WizardError::Missing(MissingField::Draft))
        );
    }

    #[test]
    fn test_require_complete_needs_platform() {
        let wizard = filled().with_platforms(0);
        assert_eq!(
            wizard.require_complete(),
            Err(WizardError::Missing(MissingField::Platform))
        );
        assert!(filled().require_complete().is_ok());
    }
}
