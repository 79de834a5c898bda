use std::future::Future;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de::DeserializeOwned, Deserialize};

use crate::gateway::ChatGateway;
use crate::models::{renumber, AnswerSet, BookPage, OptionKey, Options, Question};

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const QUIZ_SYSTEM_PROMPT: &str = r#"You extract multiple-choice quiz questions from a photographed page.

Rules:
1. Text in BOLD is a QUESTION.
2. Text in BLUE marks the CORRECT answers.
3. Every question has exactly four options labelled a, b, c, d.
4. A question may have several correct answers.

Answer with JSON only, no prose, using this shape:
{
  "questions": [
    {
      "id": 1,
      "question": "Bold question text",
      "options": { "a": "Option A", "b": "Option B", "c": "Option C", "d": "Option D" },
      "correctAnswers": ["b", "c"]
    }
  ],
  "metadata": { "title": "Quiz title if visible", "page": "Page number if visible", "year": "Year if visible" }
}

Extract every visible question, number them sequentially and keep the original language."#;

const QUIZ_INSTRUCTION: &str = "Extract every quiz question from this image. Bold text is a question, blue text marks the correct answers. Return only the JSON.";

const BOOK_SYSTEM_PROMPT: &str = r#"You extract the content of photographed book pages.

Rules:
1. Text in BOLD is a QUESTION.
2. The regular (non-bold) lines after it are the possible answers a, b, c, d.
3. Answers highlighted or printed in blue are the correct ones.

Answer with JSON only, using exactly this shape:
{
  "pages": [
    {
      "pageNumber": 1,
      "content": [
        {
          "id": 1,
          "question": "Bold question text",
          "options": { "a": "Option A", "b": "Option B", "c": "Option C", "d": "Option D" },
          "correctAnswers": ["a"]
        }
      ]
    }
  ],
  "metadata": { "title": "Book title if visible", "year": "Year if visible", "pageRange": "e.g. 1-10" }
}

Number questions sequentially and keep the original language. If nothing usable is visible, return {"pages": []}."#;

const BOOK_INSTRUCTION: &str = "Extract every question (bold text) and its answers from this book page. Mark answers printed in blue as correct. Return only the JSON.";

/// One call to a vision-capable chat model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionRequest {
    pub model: String,
    pub system_prompt: String,
    pub instruction: String,
    pub image_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("the AI gateway is not configured")]
    NotConfigured,
    #[error("the AI gateway rate limit was reached")]
    RateLimited,
    #[error("the AI gateway credits are exhausted")]
    PaymentRequired,
    #[error("the AI gateway returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("the AI gateway returned no content")]
    EmptyContent,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[cfg_attr(test, mockall::automock)]
pub trait VisionGateway: Send + Sync {
    /// Returns the assistant message content of the first choice.
    fn complete(
        &self,
        request: VisionRequest,
    ) -> impl Future<Output = Result<String, GatewayError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("the uploaded file is not an image")]
    NotAnImage,
    #[error("the uploaded image is empty")]
    EmptyImage,
    #[error("the uploaded image is larger than 10 MiB")]
    TooLarge,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("could not parse the extracted JSON: {source}")]
    Malformed {
        source: serde_json::Error,
        raw: String,
    },
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn to_data_url(&self) -> Result<String, ExtractionError> {
        if !self.content_type.starts_with("image/") {
            return Err(ExtractionError::NotAnImage);
        }
        if self.bytes.is_empty() {
            return Err(ExtractionError::EmptyImage);
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ExtractionError::TooLarge);
        }
        Ok(format!(
            "data:{};base64,{}",
            self.content_type,
            STANDARD.encode(&self.bytes)
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizMetadata {
    pub title: Option<String>,
    pub page: Option<i32>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizExtraction {
    pub questions: Vec<Question>,
    pub metadata: QuizMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookMetadata {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub page_range: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookExtraction {
    pub pages: Vec<BookPage>,
    pub metadata: BookMetadata,
}

pub struct ExtractionService<G: VisionGateway = ChatGateway> {
    gateway: G,
    quiz_model: String,
    book_model: String,
}

impl<G: VisionGateway + Clone> Clone for ExtractionService<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            quiz_model: self.quiz_model.clone(),
            book_model: self.book_model.clone(),
        }
    }
}

impl ExtractionService<ChatGateway> {
    pub fn is_enabled(&self) -> bool {
        self.gateway.is_enabled()
    }
}

impl<G: VisionGateway> ExtractionService<G> {
    pub fn new(gateway: G, quiz_model: String, book_model: String) -> Self {
        Self {
            gateway,
            quiz_model,
            book_model,
        }
    }

    pub async fn extract_quiz(
        &self,
        image: &ImageUpload,
    ) -> Result<QuizExtraction, ExtractionError> {
        let request = VisionRequest {
            model: self.quiz_model.clone(),
            system_prompt: QUIZ_SYSTEM_PROMPT.to_string(),
            instruction: QUIZ_INSTRUCTION.to_string(),
            image_url: image.to_data_url()?,
        };

        let content = self.gateway.complete(request).await?;
        let raw: RawQuizExtraction = parse_content(&content)?;
        let extraction = raw.into_extraction();

        tracing::info!(
            "extracted {} quiz questions from image",
            extraction.questions.len()
        );
        Ok(extraction)
    }

    pub async fn extract_book(
        &self,
        image: &ImageUpload,
    ) -> Result<BookExtraction, ExtractionError> {
        let request = VisionRequest {
            model: self.book_model.clone(),
            system_prompt: BOOK_SYSTEM_PROMPT.to_string(),
            instruction: BOOK_INSTRUCTION.to_string(),
            image_url: image.to_data_url()?,
        };

        let content = self.gateway.complete(request).await?;
        let raw: RawBookExtraction = parse_content(&content)?;
        let extraction = raw.into_extraction();

        tracing::info!("extracted {} book pages from image", extraction.pages.len());
        Ok(extraction)
    }
}

/// Models like to wrap JSON in Markdown fences; drop them before parsing.
fn strip_code_fences(content: &str) -> String {
    content
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

fn parse_content<T: DeserializeOwned>(content: &str) -> Result<T, ExtractionError> {
    serde_json::from_str(&strip_code_fences(content)).map_err(|source| {
        tracing::error!("malformed extraction result: {source}");
        ExtractionError::Malformed {
            source,
            raw: content.to_string(),
        }
    })
}

/// Accept `12`, `"12"`, `"12-15"` or `null`; anything without leading digits becomes `None`.
fn lenient_number<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    struct Vis;
    impl<'de> serde::de::Visitor<'de> for Vis {
        type Value = Option<i32>;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("number, numeric string or null")
        }
        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Option<i32>, E> {
            Ok(i32::try_from(v).ok())
        }
        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Option<i32>, E> {
            Ok(i32::try_from(v).ok())
        }
        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Option<i32>, E> {
            Ok(Some(v.trunc() as i32))
        }
        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Option<i32>, E> {
            let digits: String = v
                .trim()
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            Ok(digits.parse().ok())
        }
        fn visit_unit<E: serde::de::Error>(self) -> Result<Option<i32>, E> {
            Ok(None)
        }
        fn visit_none<E: serde::de::Error>(self) -> Result<Option<i32>, E> {
            Ok(None)
        }
    }
    d.deserialize_any(Vis)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(default)]
    question: String,
    #[serde(default)]
    options: Options,
    #[serde(default)]
    correct_answers: Vec<String>,
}

impl RawQuestion {
    fn into_question(self) -> Question {
        let correct_answers: AnswerSet = self
            .correct_answers
            .iter()
            .filter_map(|label| OptionKey::parse(label))
            .collect();
        Question {
            id: 0,
            question: self.question.trim().to_string(),
            options: self.options,
            correct_answers,
        }
    }
}

fn into_questions(raw: Vec<RawQuestion>) -> Vec<Question> {
    let mut questions: Vec<Question> = raw.into_iter().map(RawQuestion::into_question).collect();
    renumber(&mut questions);
    questions
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawMetadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    page: Option<i32>,
    #[serde(default, deserialize_with = "lenient_number")]
    year: Option<i32>,
    #[serde(default)]
    page_range: Option<String>,
}

#[derive(Deserialize)]
struct RawQuizExtraction {
    #[serde(default)]
    questions: Vec<RawQuestion>,
    #[serde(default)]
    metadata: Option<RawMetadata>,
}

impl RawQuizExtraction {
    fn into_extraction(self) -> QuizExtraction {
        let metadata = self.metadata.unwrap_or_default();
        QuizExtraction {
            questions: into_questions(self.questions),
            metadata: QuizMetadata {
                title: non_blank(metadata.title),
                page: metadata.page,
                year: metadata.year,
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPage {
    #[serde(default, deserialize_with = "lenient_number")]
    page_number: Option<i32>,
    #[serde(default)]
    content: Vec<RawQuestion>,
}

#[derive(Deserialize)]
struct RawBookExtraction {
    #[serde(default)]
    pages: Vec<RawPage>,
    #[serde(default)]
    metadata: Option<RawMetadata>,
}

impl RawBookExtraction {
    fn into_extraction(self) -> BookExtraction {
        let metadata = self.metadata.unwrap_or_default();
        let pages = self
            .pages
            .into_iter()
            .enumerate()
            .map(|(idx, page)| BookPage {
                page_number: page
                    .page_number
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(idx as u32 + 1),
                content: into_questions(page.content),
            })
            .collect();
        BookExtraction {
            pages,
            metadata: BookMetadata {
                title: non_blank(metadata.title),
                year: metadata.year,
                page_range: non_blank(metadata.page_range),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png() -> ImageUpload {
        ImageUpload {
            content_type: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    fn service(gateway: MockVisionGateway) -> ExtractionService<MockVisionGateway> {
        ExtractionService::new(gateway, "quiz-model".to_string(), "book-model".to_string())
    }

    fn gateway_returning(content: &'static str) -> MockVisionGateway {
        let mut mock = MockVisionGateway::new();
        mock.expect_complete()
            .returning(move |_| Box::pin(async move { Ok(content.to_string()) }));
        mock
    }

    #[test]
    fn data_url_embeds_mime_and_base64() {
        assert_eq!(png().to_data_url().unwrap(), "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn non_images_and_oversized_uploads_are_refused() {
        let text = ImageUpload {
            content_type: "text/plain".to_string(),
            bytes: b"hello".to_vec(),
        };
        assert!(matches!(text.to_data_url(), Err(ExtractionError::NotAnImage)));

        let huge = ImageUpload {
            content_type: "image/jpeg".to_string(),
            bytes: vec![0; MAX_IMAGE_BYTES + 1],
        };
        assert!(matches!(huge.to_data_url(), Err(ExtractionError::TooLarge)));
    }

    #[tokio::test]
    async fn quiz_request_uses_quiz_model_and_image() {
        let mut mock = MockVisionGateway::new();
        mock.expect_complete()
            .withf(|req| {
                req.model == "quiz-model"
                    && req.image_url.starts_with("data:image/png;base64,")
                    && req.system_prompt.contains("correctAnswers")
            })
            .returning(|_| Box::pin(async { Ok(r#"{"questions": []}"#.to_string()) }));

        let extraction = service(mock).extract_quiz(&png()).await.unwrap();
        assert!(extraction.questions.is_empty());
    }

    #[tokio::test]
    async fn fenced_quiz_json_is_parsed_and_normalised() {
        let content = r#"```json
{
  "questions": [
    {"id": 7, "question": " Capital of Burkina Faso? ",
     "options": {"a": "Bobo-Dioulasso", "b": "Ouagadougou", "c": "Koudougou", "d": "Banfora"},
     "correctAnswers": ["B", "x"]},
    {"id": 9, "question": "Second", "options": {"a": "1", "b": "2"}, "correctAnswers": ["a", "c"]}
  ],
  "metadata": {"title": "Quiz Généralités", "page": "3", "year": 2023}
}
```"#;
        let extraction = service(gateway_returning(content))
            .extract_quiz(&png())
            .await
            .unwrap();

        assert_eq!(extraction.questions.len(), 2);
        let first = &extraction.questions[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.question, "Capital of Burkina Faso?");
        assert_eq!(first.correct_answers, AnswerSet::from([OptionKey::B]));

        let second = &extraction.questions[1];
        assert_eq!(second.id, 2);
        assert_eq!(second.options.c, "");
        assert!(!second.is_complete());

        assert_eq!(
            extraction.metadata,
            QuizMetadata {
                title: Some("Quiz Généralités".to_string()),
                page: Some(3),
                year: Some(2023),
            }
        );
    }

    #[tokio::test]
    async fn book_pages_keep_numbers_and_fill_missing_ones() {
        let content = r#"{"pages": [
            {"pageNumber": "12", "content": [{"question": "Q", "options": {"a":"a","b":"b","c":"c","d":"d"}, "correctAnswers": []}]},
            {"content": []}
        ], "metadata": {"title": "  ", "year": "2024 edition", "pageRange": "12-13"}}"#;

        let extraction = service(gateway_returning(content))
            .extract_book(&png())
            .await
            .unwrap();

        assert_eq!(extraction.pages[0].page_number, 12);
        assert_eq!(extraction.pages[0].content[0].id, 1);
        assert_eq!(extraction.pages[1].page_number, 2);
        assert_eq!(extraction.metadata.title, None);
        assert_eq!(extraction.metadata.year, Some(2024));
        assert_eq!(extraction.metadata.page_range.as_deref(), Some("12-13"));
    }

    #[tokio::test]
    async fn malformed_json_keeps_raw_content() {
        let result = service(gateway_returning("Sorry, I cannot read this image."))
            .extract_quiz(&png())
            .await;

        match result {
            Err(ExtractionError::Malformed { raw, .. }) => {
                assert_eq!(raw, "Sorry, I cannot read this image.")
            }
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn gateway_errors_are_passed_through() {
        let mut mock = MockVisionGateway::new();
        mock.expect_complete()
            .returning(|_| Box::pin(async { Err(GatewayError::RateLimited) }));

        let result = service(mock).extract_book(&png()).await;
        assert!(matches!(
            result,
            Err(ExtractionError::Gateway(GatewayError::RateLimited))
        ));
    }

    #[tokio::test]
    async fn invalid_upload_never_reaches_the_gateway() {
        let mut mock = MockVisionGateway::new();
        mock.expect_complete().never();

        let empty = ImageUpload {
            content_type: "image/png".to_string(),
            bytes: Vec::new(),
        };
        let result = service(mock).extract_quiz(&empty).await;
        assert!(matches!(result, Err(ExtractionError::EmptyImage)));
    }
}
