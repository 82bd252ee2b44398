//! The sync pipeline: fetch, validate, select, render, commit
//!
//! Talks and speakers are rendered through a bounded pool of `max_parallel`
//! permits. Results are joined before anything is committed, so a failure in
//! any item leaves the output tree untouched.

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::filter::{self, Programme};
use crate::model::{self, Speaker, Talk};
use crate::output::{OutputKind, Staging};
use crate::photo;
use crate::render::{PageRenderer, SpeakerPage, TalkPage};
use crate::slug::SlugRegistry;
use crate::source::ConferenceSource;
use futures::future::join_all;
use std::path::PathBuf;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// What a run produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub talks: usize,
    pub speakers: usize,
    pub images_written: usize,
    /// Speakers with a photo URL whose download failed
    pub images_skipped: usize,
    /// Talks and speakers whose slug was disambiguated
    pub renamed_slugs: usize,
    /// Final paths of every file written (or that would be written in a dry run)
    pub files: Vec<PathBuf>,
    pub dry_run: bool,
}

#[derive(Debug)]
enum PhotoOutcome {
    Written(PathBuf),
    Failed,
    Absent,
    NotFetched,
}

#[derive(Debug)]
struct SpeakerOutcome {
    page: PathBuf,
    photo: PhotoOutcome,
}

/// Shared, read-only state for rendering one run's pages
struct PageWriter<'a> {
    config: &'a SyncConfig,
    source: &'a dyn ConferenceSource,
    renderer: PageRenderer,
    staging: &'a Staging,
    programme: &'a Programme,
    talk_slugs: SlugRegistry,
    speaker_slugs: SlugRegistry,
    permits: Semaphore,
}

/// Run one complete sync against `source`.
pub async fn run(
    config: &SyncConfig,
    source: &dyn ConferenceSource,
    dry_run: bool,
) -> Result<SyncReport> {
    let raw = source.fetch_programme().await?;
    let data = model::validate(&raw)?;
    let programme = filter::select(data);
    info!(
        "Syncing {} confirmed talks and {} speakers",
        programme.talks.len(),
        programme.speakers.len()
    );

    let (talk_slugs, speaker_slugs) = assign_slugs(&programme, config)?;
    let renamed_slugs = talk_slugs.renamed() + speaker_slugs.renamed();

    let staging = if dry_run {
        Staging::dry_run(&config.output_dir)
    } else {
        Staging::create(&config.output_dir)?
    };

    let writer = PageWriter {
        config,
        source,
        renderer: PageRenderer::new()?,
        staging: &staging,
        programme: &programme,
        talk_slugs,
        speaker_slugs,
        permits: Semaphore::new(config.max_parallel),
    };

    let talk_files = writer.write_talks().await?;
    let speaker_outcomes = writer.write_speakers().await?;
    drop(writer);

    let mut report = SyncReport {
        talks: talk_files.len(),
        speakers: speaker_outcomes.len(),
        renamed_slugs,
        dry_run,
        ..SyncReport::default()
    };
    report.files.extend(talk_files);
    for outcome in speaker_outcomes {
        report.files.push(outcome.page);
        match outcome.photo {
            PhotoOutcome::Written(path) => {
                report.images_written += 1;
                report.files.push(path);
            }
            PhotoOutcome::Failed => report.images_skipped += 1,
            PhotoOutcome::Absent | PhotoOutcome::NotFetched => {}
        }
    }

    let committed = staging.commit().await?;
    debug!("Committed {} files", committed);

    info!(
        "Sync complete: {} talks, {} speakers, {} images ({} skipped)",
        report.talks, report.speakers, report.images_written, report.images_skipped
    );
    Ok(report)
}

/// Assign slugs in source order so the first entity keeps the plain slug.
fn assign_slugs(
    programme: &Programme,
    config: &SyncConfig,
) -> Result<(SlugRegistry, SlugRegistry)> {
    let mut talks = SlugRegistry::new("talks", config.slug_collisions);
    for talk in &programme.talks {
        talks.register(&talk.id, &talk.title)?;
    }

    let mut speakers = SlugRegistry::new("speakers", config.slug_collisions);
    for speaker in &programme.speakers {
        speakers.register(&speaker.uid, &speaker.display_name)?;
    }

    Ok((talks, speakers))
}

fn slug_of<'r>(registry: &'r SlugRegistry, id: &str) -> Result<&'r str> {
    registry
        .get(id)
        .ok_or_else(|| Error::Internal(format!("no slug assigned to '{id}'")))
}

impl PageWriter<'_> {
    async fn write_talks(&self) -> Result<Vec<PathBuf>> {
        let futures = self.programme.talks.iter().map(|talk| async move {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| Error::Internal(format!("worker pool closed: {e}")))?;
            self.write_talk(talk).await
        });

        join_all(futures).await.into_iter().collect()
    }

    async fn write_speakers(&self) -> Result<Vec<SpeakerOutcome>> {
        let futures = self.programme.speakers.iter().map(|speaker| async move {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| Error::Internal(format!("worker pool closed: {e}")))?;
            self.write_speaker(speaker).await
        });

        join_all(futures).await.into_iter().collect()
    }

    async fn write_talk(&self, talk: &Talk) -> Result<PathBuf> {
        let slug = slug_of(&self.talk_slugs, &talk.id)?;
        let speakers = self
            .programme
            .speakers_of(talk)
            .filter_map(|speaker| self.speaker_slugs.get(&speaker.uid))
            .collect();

        let contents = self.renderer.render_talk(&TalkPage {
            title: &talk.title,
            start: &self.config.talk_start,
            end: &self.config.talk_end,
            speakers,
            summary: &talk.summary,
        })?;

        debug!("Rendered talk '{}' as {}", talk.title, slug);
        self.staging
            .write(OutputKind::Talks, &format!("{slug}.mdx"), contents.as_bytes())
            .await
    }

    async fn write_speaker(&self, speaker: &Speaker) -> Result<SpeakerOutcome> {
        let slug = slug_of(&self.speaker_slugs, &speaker.uid)?;
        let url = speaker.photo();

        let (extension, outcome) = match url {
            None => (photo::extension_from_url(None), PhotoOutcome::Absent),
            Some(url) if self.staging.is_dry_run() => {
                (photo::extension_from_url(Some(url)), PhotoOutcome::NotFetched)
            }
            Some(url) => match self.source.fetch_photo(url).await {
                Ok(downloaded) => {
                    let extension =
                        photo::resolve_extension(Some(url), downloaded.content_type.as_deref());
                    let path = self
                        .staging
                        .write(
                            OutputKind::Images,
                            &photo::file_name(slug, extension),
                            &downloaded.bytes,
                        )
                        .await?;
                    (extension, PhotoOutcome::Written(path))
                }
                Err(e) => {
                    warn!(
                        "Skipping photo for speaker '{}' ({}): {}",
                        speaker.display_name, url, e
                    );
                    (photo::extension_from_url(Some(url)), PhotoOutcome::Failed)
                }
            },
        };

        let image = photo::file_name(slug, extension);
        let contents = self.renderer.render_speaker(&SpeakerPage {
            name: &speaker.display_name,
            slug,
            image: &image,
            twitter: speaker.twitter.as_deref().unwrap_or_default(),
            github: speaker.github.as_deref().unwrap_or_default(),
            company: speaker.company.as_deref().unwrap_or_default(),
            bio: speaker.bio.as_deref().unwrap_or_default(),
        })?;

        let page = self
            .staging
            .write(OutputKind::Speakers, &format!("{slug}.mdx"), contents.as_bytes())
            .await?;
        Ok(SpeakerOutcome {
            page,
            photo: outcome,
        })
    }
}
