//! Read-only book catalog.
//!
//! The storefront sells a fixed list of titles seeded at start-up. Access
//! goes through [`BookCatalog`] so a database-backed catalog can replace
//! the static seed without touching order validation.

use crate::models::Book;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait BookCatalog: Send + Sync {
    async fn find(&self, book_id: &str) -> anyhow::Result<Option<Book>>;
}

pub struct StaticCatalog {
    books: Vec<Book>,
}

/// 2024-01-01T00:00:00Z
const SEED_CREATED_AT: i64 = 1_704_067_200;

impl StaticCatalog {
    pub fn new(books: Vec<Book>) -> Self {
        Self { books }
    }

    /// The production title list. Prices in paise.
    pub fn seeded() -> Self {
        let created_at = DateTime::<Utc>::from_timestamp(SEED_CREATED_AT, 0).unwrap_or_default();
        let book = |id: &str, title: &str, description: &str, price: u64, image: &str| Book {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            price,
            image_path: format!("/images/{}", image),
            created_at,
        };

        Self::new(vec![
            book(
                "1",
                "How to Find Guru",
                "Five essays on finding and recognising a bona fide spiritual master.",
                5900,
                "guru-find.jpg",
            ),
            book(
                "2",
                "Guru Tattva",
                "A paper establishing the absolute conception of the sad-guru.",
                7900,
                "guru-tattva.jpg",
            ),
            book(
                "3",
                "Solid Gold Guru-tattva",
                "A lecture on guru-tattva.",
                6000,
                "Solid-gold-guru-tattva.jpg",
            ),
            book(
                "4",
                "After the Disappearance of Sri Guru",
                "Lecture excerpts on what a disciple should do after the guru departs.",
                4000,
                "after-guru-disappear.jpg",
            ),
            book(
                "5",
                "Only by the Mercy of Sadhu Guru",
                "On the importance of the association of a pure devotee.",
                6000,
                "only-by-guru-mercy.jpg",
            ),
            book(
                "6",
                "The Formidable Foe",
                "A lecture on the subject of conquering lust.",
                5900,
                "the-formidable-foe.jpg",
            ),
            book(
                "7",
                "Mayapura 1979",
                "An account of Mayapura just before the Gaura Purnima festival of 1979.",
                4900,
                "mayapura-1979.jpg",
            ),
            book(
                "8",
                "When Good Fortune Arises",
                "Unless one gets the mercy of a sadhu one cannot get krsna-bhakti.",
                29900,
                "when-good-fortune-arises.jpg",
            ),
        ])
    }
}

#[async_trait]
impl BookCatalog for StaticCatalog {
    async fn find(&self, book_id: &str) -> anyhow::Result<Option<Book>> {
        Ok(self.books.iter().find(|b| b.id == book_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_has_unique_ids_and_positive_prices() {
        let books = StaticCatalog::seeded().books;
        assert_eq!(books.len(), 8);

        let ids: HashSet<_> = books.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids.len(), books.len());
        assert!(books.iter().all(|b| b.price > 0));
        assert_eq!(books[0].created_at.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn find_by_id() {
        let catalog = StaticCatalog::seeded();
        let book = catalog.find("8").await.unwrap().unwrap();
        assert_eq!(book.title, "When Good Fortune Arises");
        assert_eq!(book.price, 29900);
        assert!(catalog.find("missing").await.unwrap().is_none());
    }
}
