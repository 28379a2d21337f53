//! Kind-specific content payloads and their validators.
//!
//! The workflow itself never looks inside a payload; it only asks for its
//! kind and stores the serialized value. Validation runs before any
//! state-changing operation accepts a payload.

use chrono::NaiveDate;

use crate::{
    db::types::ContentKind,
    error::{ErrorKind, WorkflowError},
};

use std::fmt;

const MAX_TITLE_LENGTH: usize = 255;
const MAX_EXCERPT_LENGTH: usize = 500;
const MAX_ISBN_LENGTH: usize = 20;
const MAX_TAG_LENGTH: usize = 100;
const MAX_FILE_SIZE: i64 = 50 * 1024 * 1024;

lazy_static! {
    static ref IMAGE_EXTENSIONS: Vec<&'static str> =
        vec!["jpg", "jpeg", "png", "webp"];
}

/// Payload of a content item.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Payload {
    Article(Article),
    BookReview(BookReview),
    MediaAsset(MediaAsset),
}

impl Payload {
    pub fn kind(&self) -> ContentKind {
        match *self {
            Payload::Article(_) => ContentKind::Article,
            Payload::BookReview(_) => ContentKind::BookReview,
            Payload::MediaAsset(_) => ContentKind::MediaAsset,
        }
    }
}

impl_from! { for Payload ;
    Article => |a| Payload::Article(a),
    BookReview => |r| Payload::BookReview(r),
    MediaAsset => |m| Payload::MediaAsset(m),
}

/// A long-form insight article.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Article {
    pub title: String,
    /// Rich-text body. Stored as-is; rendering is not our concern.
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub featured_image: Option<FileRef>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A review of a published book.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BookReview {
    pub book_title: String,
    pub book_author: String,
    #[serde(default)]
    pub isbn: String,
    pub review_title: String,
    pub content: String,
    /// Rating on a one-to-five scale.
    pub rating: i32,
    #[serde(default)]
    pub cover_image: Option<FileRef>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An archived photograph, video, document, or artifact record.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MediaAsset {
    pub title: String,
    pub description: String,
    pub media_type: MediaType,
    pub file: FileRef,
    /// Alternative text for accessibility. Required for archives.
    pub alt_text: String,
    /// Date the original material was created, when known.
    #[serde(default)]
    pub date_created: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Document,
    Artifact,
}

/// Reference to an uploaded file.
///
/// Upload, storage, and encoding are handled by the host; the workflow only
/// checks the name and reported size.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FileRef {
    pub name: String,
    pub size: i64,
}

impl FileRef {
    fn extension(&self) -> Option<&str> {
        self.name.rsplit('.').next().filter(|ext| *ext != self.name)
    }
}

/// Validate a payload before it is accepted by the workflow.
pub fn validate(payload: &Payload) -> Result<(), ValidateError> {
    let mut fields = Vec::new();

    match *payload {
        Payload::Article(ref article) => {
            require(&mut fields, "title", &article.title);
            max_length(&mut fields, "title", &article.title, MAX_TITLE_LENGTH);
            require(&mut fields, "content", &article.content);
            max_length(
                &mut fields, "excerpt", &article.excerpt, MAX_EXCERPT_LENGTH);
            if let Some(ref image) = article.featured_image {
                image_file(&mut fields, "featured_image", image);
            }
            tags(&mut fields, &article.tags);
        }
        Payload::BookReview(ref review) => {
            require(&mut fields, "book_title", &review.book_title);
            max_length(
                &mut fields, "book_title", &review.book_title,
                MAX_TITLE_LENGTH);
            require(&mut fields, "book_author", &review.book_author);
            require(&mut fields, "review_title", &review.review_title);
            max_length(
                &mut fields, "review_title", &review.review_title,
                MAX_TITLE_LENGTH);
            require(&mut fields, "content", &review.content);
            max_length(&mut fields, "isbn", &review.isbn, MAX_ISBN_LENGTH);
            if review.rating < 1 || review.rating > 5 {
                fields.push(FieldError {
                    field: "rating",
                    message: format!(
                        "must be between 1 and 5, got {}", review.rating),
                });
            }
            if let Some(ref image) = review.cover_image {
                image_file(&mut fields, "cover_image", image);
            }
            tags(&mut fields, &review.tags);
        }
        Payload::MediaAsset(ref asset) => {
            require(&mut fields, "title", &asset.title);
            max_length(&mut fields, "title", &asset.title, MAX_TITLE_LENGTH);
            require(&mut fields, "description", &asset.description);
            require(&mut fields, "alt_text", &asset.alt_text);
            max_length(
                &mut fields, "alt_text", &asset.alt_text, MAX_TITLE_LENGTH);
            require(&mut fields, "file.name", &asset.file.name);
            file_size(&mut fields, "file.size", &asset.file);
            if asset.media_type == MediaType::Image {
                image_file(&mut fields, "file.name", &asset.file);
            }
            tags(&mut fields, &asset.tags);
        }
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(ValidateError { fields })
    }
}

fn require(fields: &mut Vec<FieldError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        fields.push(FieldError {
            field,
            message: "is required".to_string(),
        });
    }
}

fn max_length(
    fields: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    limit: usize,
) {
    if value.chars().count() > limit {
        fields.push(FieldError {
            field,
            message: format!("must be at most {} characters", limit),
        });
    }
}

fn tags(fields: &mut Vec<FieldError>, values: &[String]) {
    for tag in values {
        if tag.trim().is_empty() {
            fields.push(FieldError {
                field: "tags",
                message: "tags must not be empty".to_string(),
            });
        } else if tag.chars().count() > MAX_TAG_LENGTH {
            fields.push(FieldError {
                field: "tags",
                message: format!(
                    "tag {:?} is longer than {} characters",
                    tag, MAX_TAG_LENGTH),
            });
        }
    }
}

fn image_file(fields: &mut Vec<FieldError>, field: &'static str, file: &FileRef) {
    let allowed = match file.extension() {
        Some(ext) => IMAGE_EXTENSIONS.iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed)),
        None => false,
    };

    if !allowed {
        fields.push(FieldError {
            field,
            message: format!(
                "{:?} is not an accepted image format (expected one of: {})",
                file.name, IMAGE_EXTENSIONS.join(", ")),
        });
    }
}

fn file_size(fields: &mut Vec<FieldError>, field: &'static str, file: &FileRef) {
    if file.size <= 0 {
        fields.push(FieldError {
            field,
            message: "file is empty".to_string(),
        });
    } else if file.size > MAX_FILE_SIZE {
        fields.push(FieldError {
            field,
            message: format!(
                "file exceeds the maximum size of {} bytes", MAX_FILE_SIZE),
        });
    }
}

/// Field-level reason a payload was rejected.
#[derive(Clone, Debug, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Clone, Debug, Fail, Serialize)]
pub struct ValidateError {
    pub fields: Vec<FieldError>,
}

impl fmt::Display for ValidateError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Payload failed validation: ")?;

        for (inx, error) in self.fields.iter().enumerate() {
            if inx > 0 {
                write!(fmt, "; ")?;
            }
            write!(fmt, "{} {}", error.field, error.message)?;
        }

        Ok(())
    }
}

impl WorkflowError for ValidateError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::ValidationFailed
    }

    fn code(&self) -> Option<&str> {
        Some("payload:invalid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Payload {
        Payload::Article(Article {
            title: "On the naming of yams".to_string(),
            content: "<p>…</p>".to_string(),
            excerpt: String::new(),
            featured_image: None,
            tags: vec!["agriculture".to_string()],
        })
    }

    fn review() -> BookReview {
        BookReview {
            book_title: "Things Fall Apart".to_string(),
            book_author: "Chinua Achebe".to_string(),
            isbn: String::new(),
            review_title: "A classic revisited".to_string(),
            content: "<p>…</p>".to_string(),
            rating: 5,
            cover_image: None,
            tags: vec![],
        }
    }

    #[test]
    fn valid_payloads_pass() {
        validate(&article()).unwrap();
        validate(&review().into()).unwrap();
    }

    #[test]
    fn required_fields_are_reported_by_name() {
        let payload = Payload::Article(Article {
            title: "  ".to_string(),
            content: String::new(),
            excerpt: String::new(),
            featured_image: None,
            tags: vec![],
        });

        let err = validate(&payload).unwrap_err();
        let fields: Vec<_> = err.fields.iter().map(|f| f.field).collect();
        assert_eq!(fields, ["title", "content"]);
    }

    #[test]
    fn rating_must_be_in_range() {
        for rating in &[0, 6, -3] {
            let mut review = review();
            review.rating = *rating;

            let err = validate(&review.into()).unwrap_err();
            assert!(err.fields.iter().any(|f| f.field == "rating"));
        }
    }

    #[test]
    fn image_extensions_are_checked() {
        let mut review = review();
        review.cover_image = Some(FileRef {
            name: "cover.exe".to_string(),
            size: 1024,
        });

        let err = validate(&review.into()).unwrap_err();
        assert!(err.fields.iter().any(|f| f.field == "cover_image"));

        let mut review2 = self::review();
        review2.cover_image = Some(FileRef {
            name: "cover.JPG".to_string(),
            size: 1024,
        });
        validate(&review2.into()).unwrap();
    }

    #[test]
    fn media_assets_require_alt_text_and_sane_files() {
        let asset = MediaAsset {
            title: "Market day".to_string(),
            description: "Photograph of a market".to_string(),
            media_type: MediaType::Image,
            file: FileRef { name: "market.png".to_string(), size: 2048 },
            alt_text: String::new(),
            date_created: None,
            tags: vec![],
        };

        let err = validate(&asset.clone().into()).unwrap_err();
        let fields: Vec<_> = err.fields.iter().map(|f| f.field).collect();
        assert_eq!(fields, ["alt_text"]);

        let mut oversized = asset;
        oversized.alt_text = "A market stall".to_string();
        oversized.file.size = MAX_FILE_SIZE + 1;
        let err = validate(&oversized.into()).unwrap_err();
        assert!(err.fields.iter().any(|f| f.field == "file.size"));
    }

    #[test]
    fn non_image_assets_allow_other_extensions() {
        let asset = MediaAsset {
            title: "Oral history recording".to_string(),
            description: "Interview, 1987".to_string(),
            media_type: MediaType::Video,
            file: FileRef { name: "interview.mp4".to_string(), size: 4096 },
            alt_text: "Video still of the interviewee".to_string(),
            date_created: NaiveDate::from_ymd_opt(1987, 6, 1),
            tags: vec!["oral-history".to_string()],
        };

        validate(&asset.into()).unwrap();
    }

    #[test]
    fn payload_kind_matches_variant() {
        assert_eq!(article().kind(), ContentKind::Article);
        assert_eq!(Payload::from(review()).kind(), ContentKind::BookReview);
    }
}
