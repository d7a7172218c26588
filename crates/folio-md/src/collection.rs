//! Post collections.
//!
//! A [`PostSet`] is an immutable snapshot built from one complete set of
//! sources. [`Library`] holds the current snapshot and swaps it out wholesale
//! on [`Library::reload`]; there is no incremental update.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use crate::post::{Post, PostBuilder};

/// Raw sources keyed by path. Iteration order is the load order.
pub type Sources = BTreeMap<String, String>;

/// Immutable set of posts from one load.
#[derive(Debug, Default)]
pub struct PostSet {
    /// Posts in load order
    posts: Vec<Post>,

    /// Slug lookup; a later post wins over an earlier one with the same slug
    by_slug: HashMap<String, usize>,

    /// Newest-first view, computed on first access
    sorted: OnceLock<Arc<[Post]>>,
}

impl PostSet {
    /// Build every post in `sources`.
    pub fn build(sources: &Sources, builder: &PostBuilder) -> Self {
        let posts = sources
            .iter()
            .map(|(path, raw)| builder.build(path, raw))
            .collect();
        Self::from_posts(posts)
    }

    /// Wrap already built posts, keeping their order as load order.
    pub fn from_posts(posts: Vec<Post>) -> Self {
        let mut by_slug = HashMap::with_capacity(posts.len());
        for (index, post) in posts.iter().enumerate() {
            if let Some(previous) = by_slug.insert(post.slug.clone(), index) {
                tracing::warn!(
                    "Duplicate slug {} (posts {} and {}), later post wins",
                    post.slug,
                    previous,
                    index
                );
            }
        }

        Self {
            posts,
            by_slug,
            sorted: OnceLock::new(),
        }
    }

    /// Posts sorted newest first.
    ///
    /// Computed once per snapshot; later calls share the same allocation.
    pub fn sorted(&self) -> Arc<[Post]> {
        Arc::clone(self.sorted.get_or_init(|| {
            let mut posts = self.posts.clone();
            sort_newest_first(&mut posts);
            tracing::debug!("Sorted {} posts", posts.len());
            posts.into()
        }))
    }

    /// Look up a post by slug.
    pub fn get(&self, slug: &str) -> Option<&Post> {
        self.by_slug.get(slug).map(|&index| &self.posts[index])
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Sort posts by publication date, newest first.
///
/// The sort is stable: posts published at the same instant keep their
/// relative order.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

/// The current post collection.
#[derive(Clone)]
pub struct Library {
    builder: PostBuilder,
    snapshot: Arc<PostSet>,
    generation: u64,
}

impl Library {
    /// An empty library that will build posts with `builder`.
    pub fn new(builder: PostBuilder) -> Self {
        Self {
            builder,
            snapshot: Arc::new(PostSet::default()),
            generation: 0,
        }
    }

    /// A library loaded from `sources`.
    pub fn load(builder: PostBuilder, sources: &Sources) -> Self {
        let mut library = Self::new(builder);
        library.reload(sources);
        library
    }

    /// Replace the whole collection with posts built from `sources`.
    ///
    /// Snapshots handed out earlier keep their old contents.
    pub fn reload(&mut self, sources: &Sources) {
        let set = PostSet::build(sources, &self.builder);
        self.generation += 1;
        tracing::info!(
            "Loaded {} posts (generation {})",
            set.len(),
            self.generation
        );
        self.snapshot = Arc::new(set);
    }

    /// Posts sorted newest first.
    pub fn posts(&self) -> Arc<[Post]> {
        self.snapshot.sorted()
    }

    /// Look up a post by slug.
    pub fn get(&self, slug: &str) -> Option<&Post> {
        self.snapshot.get(slug)
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<PostSet> {
        Arc::clone(&self.snapshot)
    }

    /// Number of loads so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
