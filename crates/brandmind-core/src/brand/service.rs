//! Brand voice service: profile reads and writes, copy learning, and the
//! voice context injected into copywriting prompts.
//!
//! Reads are cache-aside and degrade to "no profile" on storage errors.
//! Writes go to the repository first, then invalidate the cached copy; the
//! cache is only ever filled by reads. After each write the profile's text
//! rendering is re-embedded in a detached task so retrieval can find it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use brandmind_types::content::{ContentMetadata, ContentType, NewContent};
use brandmind_types::error::BrandVoiceError;
use brandmind_types::event::LearningEvent;
use brandmind_types::profile::{BrandProfile, PerformanceTier, ProfileUpdate};
use brandmind_types::retrieval::RetrievalQuery;

use crate::cache::registry::ProfileCache;
use crate::embedding::EmbeddingModel;
use crate::event::LearningEventBus;
use crate::retrieval::{RetrievalEngine, SimilaritySearch};
use crate::storage::{ContentStore, EmbeddingRepository};

use super::analyzer::{analyze_style, derive_guidelines};
use super::repository::BrandProfileRepository;

/// Returned by [`BrandVoiceService::voice_context`] when an owner has no profile.
pub const DEFAULT_VOICE_CONTEXT: &str =
    "Write in a professional, clear, and engaging tone. No brand voice profile is available yet.";

/// Weight assumed for a tone dimension the profile has never seen.
const NEUTRAL_TONE: f32 = 0.5;

const CONTEXT_TONES: usize = 3;
const CONTEXT_SNIPPETS: usize = 3;
const CONTEXT_SNIPPET_CHARS: usize = 300;
const CONTEXT_THRESHOLD: f32 = 0.5;

pub struct BrandVoiceService<M, S, R, B>
where
    M: EmbeddingModel,
    S: SimilaritySearch,
    R: EmbeddingRepository,
    B: BrandProfileRepository,
{
    profiles: B,
    cache: Arc<ProfileCache>,
    content: Arc<ContentStore<M, R>>,
    retrieval: Arc<RetrievalEngine<M, S>>,
    events: LearningEventBus,
}

impl<M, S, R, B> BrandVoiceService<M, S, R, B>
where
    M: EmbeddingModel + 'static,
    S: SimilaritySearch,
    R: EmbeddingRepository + 'static,
    B: BrandProfileRepository,
{
    pub fn new(
        profiles: B,
        cache: Arc<ProfileCache>,
        content: Arc<ContentStore<M, R>>,
        retrieval: Arc<RetrievalEngine<M, S>>,
        events: LearningEventBus,
    ) -> Self {
        Self {
            profiles,
            cache,
            content,
            retrieval,
            events,
        }
    }

    /// Current profile for an owner, or `None` if there is none or the
    /// store could not be read.
    #[tracing::instrument(name = "get_profile", skip(self), fields(owner_id = %owner_id))]
    pub async fn get_profile(&self, owner_id: Uuid) -> Option<BrandProfile> {
        if let Some(profile) = self.cache.get(&owner_id) {
            tracing::trace!("profile cache hit");
            return Some(profile);
        }

        match self.profiles.get(&owner_id).await {
            Ok(Some(profile)) => {
                self.cache.set(owner_id, profile.clone());
                Some(profile)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load brand profile");
                None
            }
        }
    }

    /// Merge `update` into the owner's profile, creating it if needed.
    #[tracing::instrument(name = "upsert_profile", skip(self, update), fields(owner_id = %owner_id))]
    pub async fn upsert_profile(
        &self,
        owner_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<BrandProfile, BrandVoiceError> {
        if let Some(tone) = &update.voice_tone {
            validate_tone(tone)?;
        }
        self.modify_profile(owner_id, |profile| profile.apply(update))
            .await
    }

    /// Nudge the profile toward the style of a piece of copy.
    ///
    /// Signals above the threshold raise their mapped tone dimensions by
    /// `score * rate`, where the rate depends on how well the copy performed.
    #[tracing::instrument(
        name = "learn_from_copy",
        skip(self, copy_text),
        fields(owner_id = %owner_id, tier = %tier)
    )]
    pub async fn learn_from_copy(
        &self,
        owner_id: Uuid,
        copy_text: &str,
        tier: PerformanceTier,
    ) -> Result<BrandProfile, BrandVoiceError> {
        let scores = analyze_style(copy_text);
        let rate = tier.learning_rate();

        self.modify_profile(owner_id, |profile| {
            let tone = &mut profile.voice_tone;
            for (signal, score) in scores.present() {
                for dimension in signal.tone_dimensions() {
                    let weight = tone.get(dimension).copied().unwrap_or(NEUTRAL_TONE);
                    tone.insert(dimension.to_string(), (weight + score * rate).clamp(0.0, 1.0));
                }
            }
            derive_guidelines(&scores, &mut profile.style_guidelines);
            profile.updated_at = Utc::now();
        })
        .await
    }

    /// Prompt-ready description of the owner's brand voice.
    #[tracing::instrument(name = "voice_context", skip(self), fields(owner_id = %owner_id))]
    pub async fn voice_context(&self, owner_id: Uuid) -> String {
        let Some(profile) = self.get_profile(owner_id).await else {
            return DEFAULT_VOICE_CONTEXT.to_string();
        };

        let mut lines = Vec::new();
        match &profile.brand_name {
            Some(name) => lines.push(format!("Brand voice guidelines for {name}:")),
            None => lines.push("Brand voice guidelines:".to_string()),
        }

        let tones: Vec<String> = profile
            .top_tones(CONTEXT_TONES)
            .into_iter()
            .map(|(name, weight)| format!("{name} ({weight:.2})"))
            .collect();
        if !tones.is_empty() {
            lines.push(format!("- Tone: {}", tones.join(", ")));
        }

        let guidelines = profile.style_guidelines.describe();
        if !guidelines.is_empty() {
            lines.push(format!("- Style: {}", guidelines.join("; ")));
        }
        if !profile.brand_values.is_empty() {
            let values: Vec<&str> = profile.brand_values.iter().map(String::as_str).collect();
            lines.push(format!("- Brand values: {}", values.join(", ")));
        }
        if !profile.taboo_topics.is_empty() {
            let topics: Vec<&str> = profile.taboo_topics.iter().map(String::as_str).collect();
            lines.push(format!("- Avoid: {}", topics.join(", ")));
        }

        let snippets = self.supporting_snippets(&profile).await;
        if !snippets.is_empty() {
            lines.push("Examples of on-brand content:".to_string());
            lines.extend(snippets);
        }

        lines.join("\n")
    }

    /// Read the stored row (or start a new one), change it, write it back.
    ///
    /// Always works on the repository's copy, never the cache, and a failed
    /// read aborts the write.
    async fn modify_profile(
        &self,
        owner_id: Uuid,
        change: impl FnOnce(&mut BrandProfile),
    ) -> Result<BrandProfile, BrandVoiceError> {
        let mut profile = match self.profiles.get(&owner_id).await? {
            Some(existing) => existing,
            None => {
                tracing::info!("creating brand profile");
                BrandProfile::new(owner_id)
            }
        };
        change(&mut profile);

        self.profiles.upsert(&profile).await?;
        self.cache.invalidate(&owner_id);

        self.spawn_refresh(&profile);
        Ok(profile)
    }

    async fn supporting_snippets(&self, profile: &BrandProfile) -> Vec<String> {
        let subject = profile.brand_name.as_deref().unwrap_or("our brand");
        let query = RetrievalQuery::new(
            profile.owner_id,
            format!("{subject} marketing copy in the brand voice"),
        )
        .with_content_types([
            ContentType::MarketingCopy,
            ContentType::Campaign,
            ContentType::LearningExample,
        ])
        .with_limit(CONTEXT_SNIPPETS)
        .with_threshold(CONTEXT_THRESHOLD)
        .with_metadata(false);

        self.retrieval
            .retrieve(&query)
            .await
            .chunks
            .into_iter()
            .map(|chunk| {
                format!(
                    "- [{}] {}",
                    chunk.source_label,
                    truncate_chars(&chunk.content, CONTEXT_SNIPPET_CHARS)
                )
            })
            .collect()
    }

    fn spawn_refresh(&self, profile: &BrandProfile) {
        let content = Arc::clone(&self.content);
        let events = self.events.clone();
        let owner_id = profile.owner_id;
        let item = NewContent {
            owner_id,
            content_type: ContentType::BrandProfile,
            content: profile.render_text(),
            metadata: ContentMetadata {
                source: Some("brand_voice".to_string()),
                title: Some("Brand voice profile".to_string()),
                ..ContentMetadata::default()
            },
            content_ref_id: Some(profile.id.to_string()),
        };

        tokio::spawn(async move {
            match content.replace(item).await {
                Ok(embedding_id) => {
                    tracing::debug!(owner_id = %owner_id, embedding_id = %embedding_id, "brand profile re-embedded");
                    events.publish(LearningEvent::ProfileRefreshed {
                        owner_id,
                        embedding_id,
                    });
                }
                Err(e) => {
                    tracing::warn!(owner_id = %owner_id, error = %e, "failed to re-embed brand profile");
                    events.publish(LearningEvent::ProfileRefreshFailed {
                        owner_id,
                        error: e.to_string(),
                    });
                }
            }
        });
    }
}

fn validate_tone(tone: &BTreeMap<String, f32>) -> Result<(), BrandVoiceError> {
    match tone
        .iter()
        .find(|(_, weight)| !(0.0..=1.0).contains(*weight))
    {
        Some((name, weight)) => Err(BrandVoiceError::InvalidUpdate(format!(
            "voice tone '{name}' must be within [0, 1], got {weight}"
        ))),
        None => Ok(()),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::broadcast;

    use brandmind_types::profile::FocusPreference;

    use super::*;
    use crate::cache::BoundedTtlCache;
    use crate::embedding::EmbeddingService;
    use crate::test_support::{
        IdentityFingerprinter, InMemoryEmbeddingRepo, InMemoryProfileRepo, StubEmbeddingModel,
        StubSearch, hit,
    };

    type TestService =
        BrandVoiceService<StubEmbeddingModel, StubSearch, InMemoryEmbeddingRepo, InMemoryProfileRepo>;

    struct Fixture {
        service: TestService,
        profiles: InMemoryProfileRepo,
        content: InMemoryEmbeddingRepo,
        search: StubSearch,
        model: StubEmbeddingModel,
        events: LearningEventBus,
    }

    fn fixture() -> Fixture {
        let model = StubEmbeddingModel::new(4);
        let content = InMemoryEmbeddingRepo::default();
        let profiles = InMemoryProfileRepo::default();
        let search = StubSearch::default();
        let events = LearningEventBus::new(64);

        let embed_cache = Arc::new(BoundedTtlCache::new("embeddings", 100, Duration::from_secs(3600)));
        let embeddings = Arc::new(EmbeddingService::new(model.clone(), IdentityFingerprinter, embed_cache));
        let store = Arc::new(ContentStore::new(
            Arc::clone(&embeddings),
            content.clone(),
            &Default::default(),
        ));
        let query_cache = Arc::new(BoundedTtlCache::new("queries", 100, Duration::from_secs(300)));
        let retrieval = Arc::new(RetrievalEngine::new(embeddings, search.clone(), query_cache));
        let profile_cache = Arc::new(BoundedTtlCache::new("profiles", 100, Duration::from_secs(1800)));

        let service = BrandVoiceService::new(
            profiles.clone(),
            profile_cache,
            store,
            retrieval,
            events.clone(),
        );
        Fixture {
            service,
            profiles,
            content,
            search,
            model,
            events,
        }
    }

    async fn next_refresh(rx: &mut broadcast::Receiver<LearningEvent>) -> LearningEvent {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match rx.recv().await {
                    Ok(
                        event @ (LearningEvent::ProfileRefreshed { .. }
                        | LearningEvent::ProfileRefreshFailed { .. }),
                    ) => return event,
                    Ok(_) => continue,
                    Err(e) => panic!("event bus closed: {e}"),
                }
            }
        })
        .await
        .expect("profile refresh was not reported")
    }

    fn tones(pairs: &[(&str, f32)]) -> BTreeMap<String, f32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[tokio::test]
    async fn reads_are_cache_aside() {
        let f = fixture();
        let owner = Uuid::now_v7();
        f.profiles.insert(BrandProfile::new(owner));

        assert!(f.service.get_profile(owner).await.is_some());
        assert!(f.service.get_profile(owner).await.is_some());
        assert_eq!(f.profiles.reads(), 1);
    }

    #[tokio::test]
    async fn misses_are_not_cached() {
        let f = fixture();
        let owner = Uuid::now_v7();

        assert!(f.service.get_profile(owner).await.is_none());
        assert!(f.service.get_profile(owner).await.is_none());
        assert_eq!(f.profiles.reads(), 2);
    }

    #[tokio::test]
    async fn read_failures_degrade_to_none() {
        let f = fixture();
        let owner = Uuid::now_v7();
        f.profiles.insert(BrandProfile::new(owner));
        f.profiles.set_failing(true);

        assert!(f.service.get_profile(owner).await.is_none());
    }

    #[tokio::test]
    async fn upsert_invalidates_cached_profile() {
        let f = fixture();
        let owner = Uuid::now_v7();
        f.service
            .upsert_profile(
                owner,
                ProfileUpdate {
                    brand_name: Some("Acme".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            f.service.get_profile(owner).await.unwrap().brand_name.as_deref(),
            Some("Acme")
        );

        f.service
            .upsert_profile(
                owner,
                ProfileUpdate {
                    brand_name: Some("Acme Outdoors".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            f.service.get_profile(owner).await.unwrap().brand_name.as_deref(),
            Some("Acme Outdoors")
        );
    }

    #[tokio::test]
    async fn upsert_merges_into_existing_fields() {
        let f = fixture();
        let owner = Uuid::now_v7();
        let first = f
            .service
            .upsert_profile(
                owner,
                ProfileUpdate {
                    brand_name: Some("Acme".to_string()),
                    voice_tone: Some(tones(&[("friendly", 0.8)])),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let second = f
            .service
            .upsert_profile(
                owner,
                ProfileUpdate {
                    brand_values: Some(["honesty".to_string()].into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.brand_name.as_deref(), Some("Acme"));
        assert_eq!(second.voice_tone.get("friendly"), Some(&0.8));
        assert!(second.brand_values.contains("honesty"));
    }

    #[tokio::test]
    async fn out_of_range_tone_is_rejected() {
        let f = fixture();
        let err = f
            .service
            .upsert_profile(
                Uuid::now_v7(),
                ProfileUpdate {
                    voice_tone: Some(tones(&[("bold", 1.5)])),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BrandVoiceError::InvalidUpdate(_)));
        assert!(f.profiles.is_empty());
    }

    #[tokio::test]
    async fn write_failures_propagate() {
        let f = fixture();
        f.profiles.set_failing(true);
        let result = f
            .service
            .upsert_profile(Uuid::now_v7(), ProfileUpdate::default())
            .await;
        assert!(matches!(result, Err(BrandVoiceError::Persistence(_))));
    }

    #[tokio::test]
    async fn upsert_re_embeds_rendering_in_background() {
        let f = fixture();
        let owner = Uuid::now_v7();
        let mut rx = f.events.subscribe();

        let profile = f
            .service
            .upsert_profile(
                owner,
                ProfileUpdate {
                    brand_name: Some("Acme".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(next_refresh(&mut rx).await, LearningEvent::ProfileRefreshed { .. }));

        f.service
            .upsert_profile(
                owner,
                ProfileUpdate {
                    taboo_topics: Some(["politics".to_string()].into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        next_refresh(&mut rx).await;

        let rows = f.content.rows();
        assert_eq!(rows.len(), 1, "rendering is replaced, not duplicated");
        assert_eq!(rows[0].content_type, ContentType::BrandProfile);
        assert_eq!(rows[0].content_ref_id, Some(profile.id.to_string()));
        assert!(rows[0].content.starts_with("Brand voice profile for Acme."));
        assert!(rows[0].content.contains("Avoid: politics."));
    }

    #[tokio::test]
    async fn embedding_outage_does_not_fail_upsert() {
        let f = fixture();
        let owner = Uuid::now_v7();
        f.model.fail_all(true);
        let mut rx = f.events.subscribe();

        let result = f
            .service
            .upsert_profile(
                owner,
                ProfileUpdate {
                    brand_name: Some("Acme".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(result.is_ok());
        assert!(matches!(next_refresh(&mut rx).await, LearningEvent::ProfileRefreshFailed { .. }));
        assert!(f.content.rows().is_empty());
    }

    #[tokio::test]
    async fn formal_copy_raises_only_formal_dimensions() {
        let f = fixture();
        let owner = Uuid::now_v7();
        f.service
            .upsert_profile(
                owner,
                ProfileUpdate {
                    voice_tone: Some(tones(&[("friendly", 0.4), ("approachable", 0.4)])),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let profile = f
            .service
            .learn_from_copy(owner, "We therefore recommend this approach.", PerformanceTier::High)
            .await
            .unwrap();

        // formal scores 0.5 and the high tier rate is 0.3
        let professional = profile.voice_tone["professional"];
        assert!((professional - 0.65).abs() < 1e-5);
        assert!((profile.voice_tone["authoritative"] - 0.65).abs() < 1e-5);
        assert_eq!(profile.voice_tone["friendly"], 0.4);
        assert_eq!(profile.voice_tone["approachable"], 0.4);
        assert!(!profile.voice_tone.contains_key("bold"));
    }

    #[tokio::test]
    async fn failed_read_keeps_learned_tones() {
        let f = fixture();
        let owner = Uuid::now_v7();
        f.service
            .upsert_profile(
                owner,
                ProfileUpdate {
                    voice_tone: Some(tones(&[("friendly", 0.9)])),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        f.profiles.fail_next_read();

        let result = f
            .service
            .learn_from_copy(owner, "We therefore recommend this approach.", PerformanceTier::High)
            .await;
        assert!(matches!(result, Err(BrandVoiceError::Persistence(_))));

        let stored = f.service.get_profile(owner).await.unwrap();
        assert_eq!(stored.voice_tone, tones(&[("friendly", 0.9)]));

        let learned = f
            .service
            .learn_from_copy(owner, "We therefore recommend this approach.", PerformanceTier::High)
            .await
            .unwrap();
        assert_eq!(learned.voice_tone["friendly"], 0.9);
        assert!((learned.voice_tone["professional"] - 0.65).abs() < 1e-5);
    }

    #[tokio::test]
    async fn learning_ignores_a_stale_cached_profile() {
        let f = fixture();
        let owner = Uuid::now_v7();
        let mut stored = BrandProfile::new(owner);
        stored.voice_tone = tones(&[("friendly", 0.3)]);
        f.profiles.insert(stored.clone());
        assert!(f.service.get_profile(owner).await.is_some());

        // Another writer changes the row behind the cache.
        stored.voice_tone = tones(&[("friendly", 0.8)]);
        f.profiles.insert(stored);

        let learned = f
            .service
            .learn_from_copy(owner, "We therefore recommend this approach.", PerformanceTier::Low)
            .await
            .unwrap();
        assert_eq!(learned.voice_tone["friendly"], 0.8);
    }

    #[tokio::test]
    async fn learning_rate_follows_tier() {
        let f = fixture();
        let text = "Save time and enjoy effortless mornings so you can relax.";

        let high = f
            .service
            .learn_from_copy(Uuid::now_v7(), text, PerformanceTier::High)
            .await
            .unwrap();
        let low = f
            .service
            .learn_from_copy(Uuid::now_v7(), text, PerformanceTier::Low)
            .await
            .unwrap();

        assert!(high.voice_tone["customer_centric"] > low.voice_tone["customer_centric"]);
        assert!(low.voice_tone["customer_centric"] > NEUTRAL_TONE);
        assert_eq!(high.style_guidelines.focus_preference, Some(FocusPreference::Benefits));
    }

    #[tokio::test]
    async fn tone_weights_saturate_at_one() {
        let f = fixture();
        let owner = Uuid::now_v7();
        let text = "Hurry! Last chance, act now!";
        let mut profile = None;
        for _ in 0..10 {
            profile = Some(
                f.service
                    .learn_from_copy(owner, text, PerformanceTier::High)
                    .await
                    .unwrap(),
            );
        }
        let profile = profile.unwrap();
        assert_eq!(profile.voice_tone["bold"], 1.0);
        assert_eq!(profile.voice_tone["energetic"], 1.0);
    }

    #[tokio::test]
    async fn voice_context_without_profile_is_generic() {
        let f = fixture();
        assert_eq!(f.service.voice_context(Uuid::now_v7()).await, DEFAULT_VOICE_CONTEXT);
    }

    #[tokio::test]
    async fn voice_context_summarizes_profile_and_snippets() {
        let f = fixture();
        let owner = Uuid::now_v7();
        f.search.set_hits(vec![
            hit("Spring is here. Come see what's new.", ContentType::MarketingCopy, 0.9),
            hit(&"x".repeat(400), ContentType::Campaign, 0.8),
        ]);
        f.service
            .upsert_profile(
                owner,
                ProfileUpdate {
                    brand_name: Some("Acme".to_string()),
                    voice_tone: Some(tones(&[
                        ("friendly", 0.9),
                        ("bold", 0.3),
                        ("professional", 0.7),
                        ("playful", 0.6),
                    ])),
                    brand_values: Some(["honesty".to_string(), "craft".to_string()].into()),
                    taboo_topics: Some(["politics".to_string()].into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let context = f.service.voice_context(owner).await;

        assert!(context.starts_with("Brand voice guidelines for Acme:"));
        assert!(context.contains("- Tone: friendly (0.90), professional (0.70), playful (0.60)"));
        assert!(!context.contains("bold"));
        assert!(context.contains("- Brand values: craft, honesty"));
        assert!(context.contains("- Avoid: politics"));
        assert!(context.contains("- [Marketing copy] Spring is here."));
        assert!(context.contains(&format!("- [Campaign] {}...", "x".repeat(300))));
        assert_eq!(f.search.last_max_count(), Some(20));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo...");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
