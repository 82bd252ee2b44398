//! Selection of the publishable part of an export

use crate::model::{ConferenceData, Speaker, Talk};
use tracing::debug;

/// Confirmed talks and the speakers presenting them, in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Programme {
    pub talks: Vec<Talk>,
    pub speakers: Vec<Speaker>,
}

impl Programme {
    /// Kept speakers presenting `talk`, in kept-speaker order.
    pub fn speakers_of<'a>(&'a self, talk: &'a Talk) -> impl Iterator<Item = &'a Speaker> + 'a {
        self.speakers
            .iter()
            .filter(move |speaker| talk.has_speaker(&speaker.uid))
    }
}

/// Keep confirmed talks, then keep speakers referenced by at least one of them.
pub fn select(data: ConferenceData) -> Programme {
    let total_talks = data.talks.len();
    let total_speakers = data.speakers.len();

    let talks: Vec<Talk> = data
        .talks
        .into_iter()
        .filter(Talk::is_confirmed)
        .collect();

    let speakers: Vec<Speaker> = data
        .speakers
        .into_iter()
        .filter(|speaker| talks.iter().any(|talk| talk.has_speaker(&speaker.uid)))
        .collect();

    debug!(
        "Selected {}/{} talks and {}/{} speakers",
        talks.len(),
        total_talks,
        speakers.len(),
        total_speakers
    );

    Programme { talks, speakers }
}
