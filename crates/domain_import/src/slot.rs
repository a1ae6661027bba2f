//! Upload slots
//!
//! Exactly one slot exists per [`SourceRole`]. Each accepted file gets a fresh
//! ticket from a per-session counter; extraction events carrying any other
//! ticket are stale and get dropped.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use domain_member::{ExtractedMemberRecord, SourceRole};

use crate::error::ImportError;

const PDF_CONTENT_TYPE: &str = "application/pdf";
const PDF_MAGIC: &[u8] = b"%PDF-";

/// An uploaded document
#[derive(Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Hex encoded SHA-256 of the content
    pub fn checksum(&self) -> String {
        format!("{:x}", Sha256::digest(&self.bytes))
    }

    /// Checks that the file is a non-empty PDF within the size limit
    pub fn validate(&self, max_bytes: usize) -> Result<(), ImportError> {
        if self.bytes.is_empty() {
            return Err(ImportError::validation(format!("{} is empty", self.name)));
        }
        if self.bytes.len() > max_bytes {
            return Err(ImportError::validation(format!(
                "{} is {} bytes, the limit is {} bytes",
                self.name,
                self.bytes.len(),
                max_bytes
            )));
        }

        let declared_pdf = self
            .content_type
            .split(';')
            .next()
            .is_some_and(|ct| ct.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
            || self.name.to_ascii_lowercase().ends_with(".pdf");

        if !declared_pdf || !self.bytes.starts_with(PDF_MAGIC) {
            return Err(ImportError::validation(format!(
                "{} is not a PDF document",
                self.name
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Processing state of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Uploading,
    Processing,
    Extracted,
    /// Extracted and consumed by the merge
    Ready,
    Error,
}

/// One upload channel
#[derive(Debug, Clone)]
pub struct UploadSlot {
    pub role: SourceRole,
    pub file: SourceFile,
    pub status: SlotStatus,
    pub progress: u8,
    pub error: Option<String>,
    pub extracted_record: Option<ExtractedMemberRecord>,
    pub ticket: u64,
}

impl UploadSlot {
    fn new(role: SourceRole, file: SourceFile, ticket: u64) -> Self {
        Self {
            role,
            file,
            status: SlotStatus::Uploading,
            progress: 0,
            error: None,
            extracted_record: None,
            ticket,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.status, SlotStatus::Uploading | SlotStatus::Processing)
    }

    pub fn has_extraction(&self) -> bool {
        self.extracted_record.is_some()
            && matches!(self.status, SlotStatus::Extracted | SlotStatus::Ready)
    }

    pub(crate) fn mark_processing(&mut self, progress: u8) {
        self.status = SlotStatus::Processing;
        self.progress = progress;
    }

    pub(crate) fn mark_extracted(&mut self, record: ExtractedMemberRecord) {
        self.status = SlotStatus::Extracted;
        self.progress = 100;
        self.error = None;
        self.extracted_record = Some(record);
    }

    pub(crate) fn mark_failed(&mut self, message: String) {
        self.status = SlotStatus::Error;
        self.progress = 0;
        self.error = Some(message);
        self.extracted_record = None;
    }
}

/// Both upload slots of one session
#[derive(Debug, Clone, Default)]
pub struct UploadSlotManager {
    membership: Option<UploadSlot>,
    statement: Option<UploadSlot>,
    last_ticket: u64,
}

impl UploadSlotManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, role: SourceRole) -> Option<&UploadSlot> {
        match role {
            SourceRole::Membership => self.membership.as_ref(),
            SourceRole::Statement => self.statement.as_ref(),
        }
    }

    pub(crate) fn get_mut(&mut self, role: SourceRole) -> Option<&mut UploadSlot> {
        match role {
            SourceRole::Membership => self.membership.as_mut(),
            SourceRole::Statement => self.statement.as_mut(),
        }
    }

    fn entry(&mut self, role: SourceRole) -> &mut Option<UploadSlot> {
        match role {
            SourceRole::Membership => &mut self.membership,
            SourceRole::Statement => &mut self.statement,
        }
    }

    /// Slot matching both role and ticket, i.e. not stale
    pub(crate) fn current_mut(&mut self, role: SourceRole, ticket: u64) -> Option<&mut UploadSlot> {
        self.get_mut(role).filter(|slot| slot.ticket == ticket)
    }

    /// Validates and stores a file, replacing whatever the slot held
    ///
    /// # Returns
    ///
    /// The new slot's ticket and whether an occupied slot was replaced
    pub fn accept_file(
        &mut self,
        role: SourceRole,
        file: SourceFile,
        max_bytes: usize,
    ) -> Result<(u64, bool), ImportError> {
        file.validate(max_bytes)?;

        self.last_ticket += 1;
        let ticket = self.last_ticket;
        let replaced = self.entry(role).replace(UploadSlot::new(role, file, ticket)).is_some();

        tracing::debug!(%role, ticket, replaced, "File accepted into slot");
        Ok((ticket, replaced))
    }

    /// Empties a slot; `None` when it was already empty
    pub fn remove_file(&mut self, role: SourceRole) -> Option<UploadSlot> {
        self.entry(role).take()
    }

    /// Both records, when both slots hold an extraction
    pub fn extracted_pair(&self) -> Option<(&ExtractedMemberRecord, &ExtractedMemberRecord)> {
        let membership = self.membership.as_ref().filter(|s| s.has_extraction())?;
        let statement = self.statement.as_ref().filter(|s| s.has_extraction())?;
        Some((
            membership.extracted_record.as_ref()?,
            statement.extracted_record.as_ref()?,
        ))
    }

    pub fn any_in_flight(&self) -> bool {
        SourceRole::ALL
            .iter()
            .filter_map(|role| self.get(*role))
            .any(UploadSlot::is_in_flight)
    }

    pub fn slots(&self) -> impl Iterator<Item = &UploadSlot> {
        self.membership.iter().chain(self.statement.iter())
    }

    pub(crate) fn set_status_all(&mut self, from: SlotStatus, to: SlotStatus) {
        for slot in [self.membership.as_mut(), self.statement.as_mut()]
            .into_iter()
            .flatten()
        {
            if slot.status == from {
                slot.status = to;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> SourceFile {
        SourceFile::new(name, "application/pdf", b"%PDF-1.7\n...".to_vec())
    }

    #[test]
    fn test_accepts_pdf_by_content_type_or_name() {
        assert!(pdf("contract.pdf").validate(1024).is_ok());
        assert!(SourceFile::new("scan", "application/pdf", b"%PDF-1.4".to_vec())
            .validate(1024)
            .is_ok());
        assert!(SourceFile::new("scan.PDF", "application/octet-stream", b"%PDF-1.4".to_vec())
            .validate(1024)
            .is_ok());
    }

    #[test]
    fn test_rejects_non_pdf() {
        let png = SourceFile::new("photo.png", "image/png", b"\x89PNG\r\n".to_vec());
        assert!(matches!(png.validate(1024), Err(ImportError::Validation(_))));

        let renamed = SourceFile::new("photo.pdf", "application/pdf", b"\x89PNG\r\n".to_vec());
        assert!(renamed.validate(1024).is_err());
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        assert!(SourceFile::new("empty.pdf", "application/pdf", Vec::new())
            .validate(1024)
            .is_err());
        assert!(pdf("big.pdf").validate(4).is_err());
    }

    #[test]
    fn test_tickets_increase_across_roles() {
        let mut slots = UploadSlotManager::new();
        let (first, replaced) = slots.accept_file(SourceRole::Membership, pdf("a.pdf"), 1024).unwrap();
        assert!(!replaced);
        let (second, _) = slots.accept_file(SourceRole::Statement, pdf("b.pdf"), 1024).unwrap();
        let (third, replaced) = slots.accept_file(SourceRole::Membership, pdf("c.pdf"), 1024).unwrap();
        assert!(first < second && second < third);
        assert!(replaced);
        assert!(slots.current_mut(SourceRole::Membership, first).is_none());
        assert!(slots.current_mut(SourceRole::Membership, third).is_some());
    }

    #[test]
    fn test_rejected_file_leaves_slot_untouched() {
        let mut slots = UploadSlotManager::new();
        slots.accept_file(SourceRole::Membership, pdf("a.pdf"), 1024).unwrap();
        let bad = SourceFile::new("b.txt", "text/plain", b"hello".to_vec());
        assert!(slots.accept_file(SourceRole::Membership, bad, 1024).is_err());
        assert_eq!(slots.get(SourceRole::Membership).unwrap().file.name, "a.pdf");
    }

    #[test]
    fn test_checksum_is_sha256_hex() {
        let file = SourceFile::new("abc.pdf", "application/pdf", b"abc".to_vec());
        assert_eq!(
            file.checksum(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
