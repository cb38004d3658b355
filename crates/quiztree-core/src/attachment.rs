//! Markdown links for uploaded files.

use crate::store::QuestionStore;
use crate::traits::FileUploader;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp"];

/// Whether a file name looks like an image that Markdown can inline.
pub fn is_image(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// `![name](url)` for images, `[name](url)` for anything else.
pub fn attachment_markdown(file_name: &str, url: &str) -> String {
    if is_image(file_name) {
        format!("![{file_name}]({url})")
    } else {
        format!("[{file_name}]({url})")
    }
}

/// Upload a file and link it from a question's text.
///
/// Returns the uploaded URL. Fails without touching the store if the upload
/// fails or the question no longer exists.
pub async fn upload_attachment(
    store: &mut QuestionStore,
    uploader: &dyn FileUploader,
    question_id: &str,
    file_name: &str,
    bytes: Vec<u8>,
) -> anyhow::Result<String> {
    anyhow::ensure!(
        store.get(question_id).is_some(),
        "question not found: {question_id}"
    );
    let url = uploader.upload(file_name, bytes).await?;
    store.append_attachment(question_id, file_name, &url);
    tracing::debug!(question = question_id, %url, "attached file");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticUploader;

    #[async_trait]
    impl FileUploader for StaticUploader {
        async fn upload(&self, file_name: &str, _bytes: Vec<u8>) -> anyhow::Result<String> {
            Ok(format!("https://files.example/{file_name}"))
        }
    }

    struct FailingUploader;

    #[async_trait]
    impl FileUploader for FailingUploader {
        async fn upload(&self, _file_name: &str, _bytes: Vec<u8>) -> anyhow::Result<String> {
            anyhow::bail!("storage unavailable")
        }
    }

    #[test]
    fn markdown_for_images_and_files() {
        assert_eq!(
            attachment_markdown("Graph.PNG", "https://x/g.png"),
            "![Graph.PNG](https://x/g.png)"
        );
        assert_eq!(
            attachment_markdown("syllabus.pdf", "https://x/s.pdf"),
            "[syllabus.pdf](https://x/s.pdf)"
        );
        assert!(!is_image("README"));
    }

    #[tokio::test]
    async fn upload_appends_link() {
        let mut store = QuestionStore::new();
        let id = store.add_question(None).unwrap();
        let url = upload_attachment(&mut store, &StaticUploader, &id, "cat.jpg", vec![1, 2])
            .await
            .unwrap();
        assert_eq!(url, "https://files.example/cat.jpg");
        assert_eq!(
            store.get(&id).unwrap().question,
            "![cat.jpg](https://files.example/cat.jpg)"
        );
    }

    #[tokio::test]
    async fn failed_upload_leaves_question_unchanged() {
        let mut store = QuestionStore::new();
        let id = store.add_question(None).unwrap();
        let err = upload_attachment(&mut store, &FailingUploader, &id, "a.txt", vec![])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unavailable"));
        assert!(store.get(&id).unwrap().question.is_empty());

        assert!(
            upload_attachment(&mut store, &StaticUploader, "missing", "a.txt", vec![])
                .await
                .is_err()
        );
    }
}
