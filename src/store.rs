use std::fs::{self, File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use log::info;

use crate::article::{Article, ArticleStatus, EntityId};
use crate::error::StoreError;
use crate::time_ago::parse_timestamp;

/// Article rows kept in a JSON file
///
/// The file belongs to the moderation/upload side of the system; the feed
/// backend only reads it, re-reading on every request so edits show up
/// without a restart.
#[derive(Debug, Clone)]
pub struct ArticleStore {
    path: PathBuf,
}

impl ArticleStore {
    /// Open the store, creating the file with sample articles if it is missing
    ///
    /// # Arguments
    /// * `path` - Location of the JSON article file
    ///
    /// # Returns
    /// * `Result<ArticleStore, StoreError>` - The store, or an I/O / JSON error
    pub fn init(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                create_dir_all(dir)?;
            }
        }

        if !path.exists() {
            let samples = sample_articles();
            info!(
                "Seeding {} with {} sample articles",
                path.display(),
                samples.len()
            );
            let json = serde_json::to_string_pretty(&samples)?;
            let mut file = File::create(path)?;
            file.write_all(json.as_bytes())?;
        }

        Ok(ArticleStore {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every row in the file, in file order
    pub fn all(&self) -> Result<Vec<Article>, StoreError> {
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Approved articles, newest first
    pub fn approved(&self) -> Result<Vec<Article>, StoreError> {
        let mut articles: Vec<Article> = self
            .all()?
            .into_iter()
            .filter(Article::is_approved)
            .collect();

        // Unparseable timestamps sort last
        articles.sort_by(|a, b| {
            parse_timestamp(&b.created_at).cmp(&parse_timestamp(&a.created_at))
        });
        Ok(articles)
    }
}

fn sample_articles() -> Vec<Article> {
    let rows = [
        (
            "Campus Innovation Lab Opens New Research Wing",
            "The university's new research facility promises to revolutionize student research opportunities with state-of-the-art equipment and collaborative spaces.",
            "Campus",
        ),
        (
            "Basketball Team Wins Championship",
            "Our university basketball team secured their first championship in five years with a thrilling overtime victory. The final score was 78-75.",
            "Sports",
        ),
        (
            "New Computer Science Program Launched",
            "The university introduces a cutting-edge AI and Machine Learning specialization track for computer science students.",
            "Campus",
        ),
        (
            "Spring Festival: A Grand Success",
            "Students and faculty came together for the annual spring festival featuring cultural performances, food stalls, and art exhibitions.",
            "Events",
        ),
        (
            "Student Develops Study Group App",
            "A computer science student built an app that helps students find study groups and collaborative learning opportunities.",
            "Opinion",
        ),
        (
            "Breakthrough in Renewable Energy Research",
            "University researchers make significant progress in developing more efficient solar panel technology.",
            "Campus",
        ),
        (
            "New Student Center Opens Doors",
            "The newly constructed student center offers study rooms, recreational areas, and dining options.",
            "Campus",
        ),
        (
            "Environmental Club Launches Campus Green Initiative",
            "A student-led environmental group introduces recycling programs and sustainability workshops on campus.",
            "Campus",
        ),
        (
            "Drama Society's Winter Performance Sold Out",
            "The annual winter theater production received rave reviews with all shows completely sold out.",
            "Events",
        ),
        (
            "Career Fair Attracts Top Tech Companies",
            "Over 50 technology companies took part in this year's career fair, offering internships and full-time positions.",
            "Campus",
        ),
        (
            "University Debate Team Takes National Title",
            "Our debate team won the national championship, defeating teams from universities across the country.",
            "Sports",
        ),
        (
            "Library Extends Hours for Exam Season",
            "The main library will stay open around the clock during the final two weeks of the semester.",
            "Campus",
        ),
    ];

    let now = Utc::now();
    rows.iter()
        .enumerate()
        .map(|(i, (title, body, tag))| Article {
            id: EntityId::Number(i as i64 + 1),
            title: title.to_string(),
            body: body.to_string(),
            tag: tag.to_string(),
            image_path: format!("/uploads/sample-{}.jpg", i % 3 + 1),
            author_name: "Proto Admin".to_string(),
            created_at: (now - Duration::hours(i as i64 * 7))
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            status: ArticleStatus::Approved,
        })
        .collect()
}
