//! End-to-end flows across the services, wired the way the CLI wires them
//! but with in-memory collaborators.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use uuid::Uuid;

use brandmind_types::config::CacheConfig;
use brandmind_types::content::{ContentMetadata, ContentType, NewContent};
use brandmind_types::event::LearningEvent;
use brandmind_types::feedback::FeedbackAction;
use brandmind_types::preference::TONE_PREFERENCE;
use brandmind_types::profile::{PerformanceTier, ProfileUpdate};
use brandmind_types::retrieval::RetrievalQuery;

use crate::brand::BrandVoiceService;
use crate::cache::CacheRegistry;
use crate::embedding::EmbeddingService;
use crate::event::LearningEventBus;
use crate::learning::{FeedbackLearner, PreferenceRepository};
use crate::retrieval::RetrievalEngine;
use crate::storage::{ContentStore, chunk_spans, chunk_text};
use crate::test_support::{
    IdentityFingerprinter, InMemoryEmbeddingRepo, InMemoryFeedbackRepo, InMemoryPreferenceRepo,
    InMemoryProfileRepo, StubEmbeddingModel, StubSearch, hit,
};

struct Stack {
    retrieval: Arc<RetrievalEngine<StubEmbeddingModel, InMemoryEmbeddingRepo>>,
    content: Arc<ContentStore<StubEmbeddingModel, InMemoryEmbeddingRepo>>,
    learner: FeedbackLearner<
        StubEmbeddingModel,
        InMemoryEmbeddingRepo,
        InMemoryFeedbackRepo,
        InMemoryPreferenceRepo,
    >,
    brand: BrandVoiceService<
        StubEmbeddingModel,
        InMemoryEmbeddingRepo,
        InMemoryEmbeddingRepo,
        InMemoryProfileRepo,
    >,
    preferences: InMemoryPreferenceRepo,
    profiles: InMemoryProfileRepo,
    events: LearningEventBus,
    caches: CacheRegistry,
}

fn stack() -> Stack {
    let caches = CacheRegistry::new(&CacheConfig::default());
    let model = StubEmbeddingModel::new(8);
    let rows = InMemoryEmbeddingRepo::default();
    let preferences = InMemoryPreferenceRepo::default();
    let profiles = InMemoryProfileRepo::default();
    let events = LearningEventBus::new(64);

    let embeddings = Arc::new(EmbeddingService::new(
        model,
        IdentityFingerprinter,
        caches.embeddings(),
    ));
    let content = Arc::new(ContentStore::new(
        Arc::clone(&embeddings),
        rows.clone(),
        &Default::default(),
    ));
    let retrieval = Arc::new(RetrievalEngine::new(
        embeddings,
        rows.clone(),
        caches.queries(),
    ));
    let learner = FeedbackLearner::new(
        InMemoryFeedbackRepo::default(),
        preferences.clone(),
        Arc::clone(&content),
        events.clone(),
    );
    let brand = BrandVoiceService::new(
        profiles.clone(),
        caches.profiles(),
        Arc::clone(&content),
        Arc::clone(&retrieval),
        events.clone(),
    );

    Stack {
        retrieval,
        content,
        learner,
        brand,
        preferences,
        profiles,
        events,
        caches,
    }
}

#[test]
fn sentence_chunks_cover_the_input() {
    let text = "A. B. C.";
    let chunks = chunk_text(text, 5, 1);

    assert!(chunks.iter().all(|c| c.ends_with('.')));
    let spans = chunk_spans(text, 5, 1);
    assert_eq!(spans.first().map(|s| s.start), Some(0));
    assert_eq!(spans.last().map(|s| s.end), Some(text.len()));
    for pair in spans.windows(2) {
        assert!(pair[1].start <= pair[0].end, "no gap between chunks");
    }
}

#[tokio::test]
async fn empty_search_is_an_empty_result() {
    let model = StubEmbeddingModel::new(4);
    let caches = CacheRegistry::default();
    let embeddings = Arc::new(EmbeddingService::new(model, IdentityFingerprinter, caches.embeddings()));
    let engine = RetrievalEngine::new(embeddings, StubSearch::default(), caches.queries());

    let result = engine.retrieve(&RetrievalQuery::new(Uuid::now_v7(), "anything")).await;

    assert!(result.chunks.is_empty());
    assert_eq!(result.total_matched, 0);
}

#[tokio::test]
async fn identical_retrievals_hit_search_once() {
    let owner = Uuid::now_v7();
    let search = StubSearch::with_hits(vec![
        hit("Summer sale copy", ContentType::MarketingCopy, 0.91),
        hit("Brand story", ContentType::Document, 0.82),
    ]);
    let caches = CacheRegistry::default();
    let embeddings = Arc::new(EmbeddingService::new(
        StubEmbeddingModel::new(4),
        IdentityFingerprinter,
        caches.embeddings(),
    ));
    let engine = RetrievalEngine::new(embeddings, search.clone(), caches.queries());
    let query = RetrievalQuery::new(owner, "summer sale");

    let first = engine.retrieve(&query).await;
    let second = engine.retrieve(&query).await;

    assert_eq!(first, second);
    assert_eq!(search.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn cached_retrieval_expires_with_query_ttl() {
    let search = StubSearch::with_hits(vec![hit("copy", ContentType::MarketingCopy, 0.9)]);
    let caches = CacheRegistry::default();
    let embeddings = Arc::new(EmbeddingService::new(
        StubEmbeddingModel::new(4),
        IdentityFingerprinter,
        caches.embeddings(),
    ));
    let engine = RetrievalEngine::new(embeddings, search.clone(), caches.queries());
    let query = RetrievalQuery::new(Uuid::now_v7(), "copy");

    engine.retrieve(&query).await;
    tokio::time::advance(caches.queries().default_ttl() + Duration::from_secs(1)).await;
    engine.retrieve(&query).await;

    assert_eq!(search.calls(), 2);
}

#[tokio::test]
async fn approvals_raise_tone_confidence() {
    let s = stack();
    let owner = Uuid::now_v7();
    s.learner
        .set_preference(owner, TONE_PREFERENCE, Value::from("warm"), 0.6)
        .await
        .unwrap();
    let mut rx = s.events.subscribe();

    for i in 0..5 {
        s.learner
            .record_feedback(owner, "copywriter", FeedbackAction::Approve, &format!("draft {i}"), None, None)
            .await;
    }

    let reinforced = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(LearningEvent::PreferenceReinforced { sample_size, .. }) = rx.recv().await {
                return sample_size;
            }
        }
    })
    .await
    .unwrap();

    let record = s.preferences.get(&owner, TONE_PREFERENCE).await.unwrap().unwrap();
    assert!(record.confidence_score > 0.6);
    assert_eq!(reinforced, 2);
    assert_eq!(record.sample_size, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_triggering_approval_adds_one_sample() {
    let s = stack();
    let owner = Uuid::now_v7();
    s.learner
        .set_preference(owner, TONE_PREFERENCE, Value::from("warm"), 0.6)
        .await
        .unwrap();
    s.preferences.set_read_delay(Duration::from_millis(15));
    let mut rx = s.events.subscribe();

    let approvals = 7;
    for i in 0..approvals {
        s.learner
            .record_feedback(owner, "copywriter", FeedbackAction::Approve, &format!("draft {i}"), None, None)
            .await;
    }
    let triggers = approvals - 4;

    let mut seen = 0;
    tokio::time::timeout(Duration::from_secs(5), async {
        while seen < triggers {
            if let Ok(LearningEvent::PreferenceReinforced { .. }) = rx.recv().await {
                seen += 1;
            }
        }
    })
    .await
    .unwrap();

    let record = s.preferences.get(&owner, TONE_PREFERENCE).await.unwrap().unwrap();
    assert_eq!(record.sample_size, 1 + triggers as u32);
}

#[tokio::test]
async fn formal_copy_moves_formal_dimensions_only() {
    let s = stack();
    let owner = Uuid::now_v7();
    let seeded: BTreeMap<String, f32> = [
        ("professional", 0.5),
        ("authoritative", 0.5),
        ("friendly", 0.6),
        ("approachable", 0.6),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    s.brand
        .upsert_profile(
            owner,
            ProfileUpdate {
                voice_tone: Some(seeded),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let profile = s
        .brand
        .learn_from_copy(
            owner,
            "The results are therefore consistent across every region.",
            PerformanceTier::Medium,
        )
        .await
        .unwrap();

    assert!(profile.voice_tone["professional"] > 0.5);
    assert!(profile.voice_tone["authoritative"] > 0.5);
    assert_eq!(profile.voice_tone["friendly"], 0.6);
    assert_eq!(profile.voice_tone["approachable"], 0.6);
}

#[tokio::test]
async fn upsert_then_read_returns_fresh_value() {
    let s = stack();
    let owner = Uuid::now_v7();
    s.brand
        .upsert_profile(
            owner,
            ProfileUpdate {
                brand_name: Some("Northwind".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    // Warm the cache with the old value.
    assert!(s.brand.get_profile(owner).await.is_some());
    assert!(s.caches.profiles().get(&owner).is_some());

    s.brand
        .upsert_profile(
            owner,
            ProfileUpdate {
                brand_name: Some("Northwind Traders".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(s.caches.profiles().get(&owner).is_none(), "writes invalidate, never fill");

    let reads_before = s.profiles.reads();
    let profile = s.brand.get_profile(owner).await.unwrap();
    assert_eq!(profile.brand_name.as_deref(), Some("Northwind Traders"));
    assert_eq!(s.profiles.reads(), reads_before + 1);
}

#[tokio::test]
async fn stored_content_becomes_retrievable() {
    let s = stack();
    let owner = Uuid::now_v7();
    let copy = "Fresh roasted coffee delivered every Monday.";
    s.content
        .store(
            owner,
            ContentType::MarketingCopy,
            copy,
            ContentMetadata {
                title: Some("Subscription email".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    s.content
        .store(owner, ContentType::Document, "Shipping policy and returns.", ContentMetadata::default(), None)
        .await
        .unwrap();

    let query = RetrievalQuery::new(owner, copy).with_threshold(0.0);
    let result = s.retrieval.retrieve(&query).await;

    assert_eq!(result.total_matched, 2);
    assert_eq!(result.chunks[0].content, copy);
    assert_eq!(result.chunks[0].source_label, "Subscription email");
    assert!((result.chunks[0].similarity - 1.0).abs() < 1e-5);
    for pair in result.chunks.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }

    let other_owner = RetrievalQuery::new(Uuid::now_v7(), copy).with_threshold(0.0);
    assert!(s.retrieval.retrieve(&other_owner).await.is_empty());
}

#[tokio::test]
async fn retrieval_respects_limit_across_many_rows() {
    let s = stack();
    let owner = Uuid::now_v7();
    let items = (0..12)
        .map(|i| NewContent {
            owner_id: owner,
            content_type: ContentType::Campaign,
            content: format!("Campaign number {i} for the autumn launch"),
            metadata: ContentMetadata::default(),
            content_ref_id: Some(format!("campaign-{i}")),
        })
        .collect();
    assert_eq!(s.content.store_batch(items).await.len(), 12);

    for limit in [0, 1, 5, 20] {
        let query = RetrievalQuery::new(owner, "autumn launch campaign")
            .with_threshold(0.0)
            .with_limit(limit);
        let result = s.retrieval.retrieve(&query).await;
        assert!(result.chunks.len() <= limit);
        assert!(result.total_matched >= result.chunks.len());
        for pair in result.chunks.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }
}
