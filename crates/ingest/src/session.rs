use crate::convert::{convert, BuilderEstimate};
use crate::error::ImportError;
use crate::model::ExcelParseResult;

/// Identifies one upload. Only the most recent ticket may complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UploadTicket(u64);

/// One user's upload → preview → import flow, last upload wins.
///
/// A parse finishing for an upload that has since been superseded is
/// dropped. Nothing reaches the builder until `import` succeeds.
#[derive(Debug, Default)]
pub struct UploadSession {
    latest: u64,
    preview: Option<ExcelParseResult>,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new upload. Any pending preview is discarded and in-flight
    /// uploads become stale.
    pub fn begin(&mut self) -> UploadTicket {
        self.latest += 1;
        self.preview = None;
        UploadTicket(self.latest)
    }

    /// Store a finished parse. Returns false (and drops the result) when the
    /// ticket has been superseded.
    pub fn complete(&mut self, ticket: UploadTicket, result: ExcelParseResult) -> bool {
        if ticket.0 != self.latest {
            log::debug!("discarding stale upload {} (latest {})", ticket.0, self.latest);
            return false;
        }
        self.preview = Some(result);
        true
    }

    pub fn preview(&self) -> Option<&ExcelParseResult> {
        self.preview.as_ref()
    }

    /// Replace the preview with an edited copy (see `without_rows`,
    /// `with_category`).
    pub fn apply<F>(&mut self, edit: F) -> Result<(), ImportError>
    where
        F: FnOnce(&ExcelParseResult) -> Result<ExcelParseResult, ImportError>,
    {
        let current = self.preview.as_ref().ok_or(ImportError::NothingToImport)?;
        let next = edit(current)?;
        self.preview = Some(next);
        Ok(())
    }

    /// Cancel the preview. Nothing has been written anywhere.
    pub fn discard(&mut self) -> Option<ExcelParseResult> {
        self.preview.take()
    }

    /// Convert the preview for the builder. On success the preview is
    /// consumed; when blocked it stays so the user can fix rows and retry.
    pub fn import(&mut self) -> Result<BuilderEstimate, ImportError> {
        let current = self.preview.as_ref().ok_or(ImportError::NothingToImport)?;
        let estimate = convert(current)?;
        self.preview = None;
        Ok(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::pipeline::parse_bytes;

    fn parse(csv: &str) -> ExcelParseResult {
        parse_bytes(csv.as_bytes(), &PipelineConfig::default()).unwrap()
    }

    const GOOD: &str = "Description,Total\nShingles,100\nFelt,20\n";
    const BAD: &str = "Description,Qty,Total\nShingles,abc,100\nFelt,1,20\n";

    #[test]
    fn last_upload_wins() {
        let mut session = UploadSession::new();
        let first = session.begin();
        let second = session.begin();
        assert!(session.complete(second, parse(GOOD)));
        assert!(!session.complete(first, parse(BAD)));
        assert!(!session.preview().unwrap().has_errors());
    }

    #[test]
    fn begin_clears_pending_preview() {
        let mut session = UploadSession::new();
        let ticket = session.begin();
        session.complete(ticket, parse(GOOD));
        session.begin();
        assert!(session.preview().is_none());
    }

    #[test]
    fn blocked_import_keeps_preview() {
        let mut session = UploadSession::new();
        let ticket = session.begin();
        session.complete(ticket, parse(BAD));

        assert!(matches!(session.import(), Err(ImportError::ConversionBlocked { .. })));
        assert!(session.preview().is_some());

        session.apply(|r| r.without_rows(&[1])).unwrap();
        let estimate = session.import().unwrap();
        assert_eq!(estimate.item_count(), 1);
        assert!(session.preview().is_none());
        assert!(matches!(session.import(), Err(ImportError::NothingToImport)));
    }

    #[test]
    fn discard_and_edit_without_preview() {
        let mut session = UploadSession::new();
        assert!(matches!(
            session.apply(|r| r.with_category(1, "Roofing")),
            Err(ImportError::NothingToImport)
        ));
        let ticket = session.begin();
        session.complete(ticket, parse(GOOD));
        assert!(session.discard().is_some());
        assert!(session.discard().is_none());
    }
}
