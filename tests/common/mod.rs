#![allow(dead_code)]

use proto_news::article::{Article, ArticleStatus, EntityId};

/// Approved article with a predictable title and a fixed timestamp
pub fn article(n: i64) -> Article {
    Article {
        id: EntityId::Number(n),
        title: format!("Article {}", n),
        body: format!("Body of article {}", n),
        tag: "Campus".to_string(),
        image_path: format!("/uploads/{}.jpg", n),
        author_name: "Test Author".to_string(),
        created_at: "2024-03-01 10:00:00".to_string(),
        status: ArticleStatus::Approved,
    }
}

pub fn articles(count: i64) -> Vec<Article> {
    (1..=count).map(article).collect()
}

pub fn ids(articles: &[Article]) -> Vec<EntityId> {
    articles.iter().map(|a| a.id.clone()).collect()
}
