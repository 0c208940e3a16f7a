use anyhow::{anyhow, Result};
use maira_core::client::GeminiClient;
use maira_core::resolver::ModelResolver;
use maira_core::types::{Content, GenerateContentRequest, GenerationConfig, Part};
use maira_memory::MemoryRecord;
use tracing::debug;

/// Message assumed when the client sends none
pub const DEFAULT_MESSAGE: &str = "Halo Maira!";

const TEMPERATURE: f64 = 0.2;
const MAX_OUTPUT_TOKENS: i32 = 2048;

/// Fixed persona and answering rules for every generation call
pub const SYSTEM_INSTRUCTION: &str = "\
NAMA & PERAN: Maira, asisten di bidang produksi PT. Well Maira Food.

ATURAN MERESPON (SANGAT PENTING):
1. JANGAN memberikan salam (seperti Halo, Hai, Selamat pagi, dll) jika kamu sedang menjawab pertanyaan teknis atau pertanyaan lanjutan.
2. HANYA berikan salam JIKA pesan user adalah sapaan pertama kali (seperti \"Halo\", \"Maira\").
3. Jika user bertanya tentang SOP/isi dokumen, LANGSUNG jawab ke intinya tanpa basa-basi pembuka.
4. Jawab HANYA berdasarkan dokumen yang ada. Jika tidak ada, bilang jujur.
5. Gunakan bahasa santai Saya namun tetap informatif.
6. Selalu ingat aspek K3 di akhir jawaban jika relevan dengan instruksi kerja.

ATURAN SUMBER:
1. Di akhir setiap jawaban, kamu WAJIB menuliskan sumber dokumen yang kamu pakai dengan format: [Sumber: NamaFile1.pdf, NamaFile2.pdf]
2. Jika jawaban diambil dari lebih dari satu dokumen, sebutkan semuanya.
3. Jika kamu menjawab berdasarkan ingatan umum karena tidak ada di dokumen (setelah memberi disclaimer), jangan tuliskan sumber ini.";

/// Assemble the prompt parts: one file reference per remembered
/// document, in store order, followed by the user's message.
///
/// The whole document history is resent on every call; there is no
/// truncation or windowing. Open scalability question, kept as-is.
fn build_parts(records: &[MemoryRecord], message: Option<&str>) -> Vec<Part> {
    let mut parts: Vec<Part> = records
        .iter()
        .map(|record| {
            Part::file_data(
                record.file_data.mime_type.clone(),
                record.file_data.file_uri.clone(),
            )
        })
        .collect();

    let message = match message {
        Some(text) if !text.is_empty() => text,
        _ => DEFAULT_MESSAGE,
    };
    parts.push(Part::text(message.to_string()));

    parts
}

/// Construct the full generation request for the given store contents
/// and user message
pub fn build_request(records: &[MemoryRecord], message: Option<&str>) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user(build_parts(records, message))],
        system_instruction: Some(Content {
            parts: vec![Part::text(SYSTEM_INSTRUCTION.to_string())],
            role: None,
        }),
        generation_config: Some(GenerationConfig {
            temperature: Some(TEMPERATURE),
            max_output_tokens: Some(MAX_OUTPUT_TOKENS),
            ..Default::default()
        }),
    }
}

/// Resolve the model, invoke the generation call and extract the reply
pub async fn generate_reply(
    client: &GeminiClient,
    resolver: &ModelResolver,
    records: &[MemoryRecord],
    message: Option<&str>,
) -> Result<String> {
    let model = resolver.resolve().await;
    let request = build_request(records, message);
    debug!(model = %model, documents = records.len(), "Invoking generation");

    let response = client
        .generate_content(&model, request)
        .await
        .map_err(|e| anyhow!("Failed to get response from LLM: {}", e))?;

    client
        .extract_text(&response)
        .map_err(|e| anyhow!("Failed to extract response text: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u32) -> MemoryRecord {
        MemoryRecord::new(
            "application/pdf",
            format!("https://generativelanguage.googleapis.com/v1beta/files/doc-{n}"),
            format!("dokumen-{n}.pdf"),
        )
    }

    #[test]
    fn empty_store_yields_only_the_text_part() {
        let parts = build_parts(&[], Some("Halo Maira!"));
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].text.as_deref(), Some("Halo Maira!"));
        assert!(parts[0].file_data.is_none());
    }

    #[test]
    fn missing_or_empty_message_defaults_to_greeting() {
        let parts = build_parts(&[], None);
        assert_eq!(parts[0].text.as_deref(), Some(DEFAULT_MESSAGE));

        let parts = build_parts(&[], Some(""));
        assert_eq!(parts[0].text.as_deref(), Some(DEFAULT_MESSAGE));
    }

    #[test]
    fn file_parts_precede_the_message_in_store_order() {
        let records = vec![record(1), record(2)];
        let parts = build_parts(&records, Some("Apa isi dokumen ini?"));

        assert_eq!(parts.len(), 3);
        assert_eq!(
            parts[0].file_data.as_ref().unwrap().file_uri,
            "https://generativelanguage.googleapis.com/v1beta/files/doc-1"
        );
        assert_eq!(
            parts[1].file_data.as_ref().unwrap().file_uri,
            "https://generativelanguage.googleapis.com/v1beta/files/doc-2"
        );
        assert_eq!(parts[2].text.as_deref(), Some("Apa isi dokumen ini?"));
    }

    #[test]
    fn request_carries_persona_and_generation_config() {
        let request = build_request(&[record(1)], Some("Apa isi dokumen ini?"));

        let system = request.system_instruction.as_ref().unwrap();
        assert!(system.parts[0]
            .text
            .as_deref()
            .unwrap()
            .contains("NAMA & PERAN: Maira"));

        let config = request.generation_config.as_ref().unwrap();
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.max_output_tokens, Some(2048));

        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.contents[0].role.as_deref(), Some("user"));
        assert_eq!(request.contents[0].parts.len(), 2);
    }
}
