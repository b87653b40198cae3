//! Record loop: string lookup, name extraction and per-kind dispatch.

use std::borrow::Cow;

use tracing::{debug, info, trace, warn};

use super::record::{split_stab_name, stab_string, RawStab, StabIter, StabKind};
use super::scope::ScopeTracker;
use crate::database::SymbolDatabase;
use crate::error::StabResult;

/// Counters describing one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StabStats
{
    /// Records read from `.stab`
    pub records: usize,
    /// Records whose handler reported a failure
    pub failed: usize,
    /// Records of kinds the parser does not handle
    pub ignored: usize,
    /// Cross references resolved against an existing definition
    pub resolved_references: usize,
    /// Cross references that became empty placeholders
    pub placeholder_references: usize,
}

/// Parser state: the database being filled plus the scope tracker.
pub(crate) struct StabParser<'db>
{
    pub(crate) db: &'db mut SymbolDatabase,
    pub(crate) scope: ScopeTracker,
    pub(crate) stats: StabStats,
    /// Type definitions currently being parsed, innermost included
    pub(crate) type_depth: usize,
}

/// Populate `db` from raw `.stab` and `.stabstr` contents.
///
/// Malformed records are logged and skipped. After the last record an empty
/// source-file record is processed to close any file still open, and pending
/// cross references are drained.
///
/// ## Errors
///
/// Only [`StabError::Allocation`](crate::error::StabError::Allocation) is
/// returned; the caller should drop the partially filled database.
pub fn parse_stabs(db: &mut SymbolDatabase, stabs: &[u8], strings: &[u8], big_endian: bool) -> StabResult<StabStats>
{
    let mut parser = StabParser {
        scope: ScopeTracker::new(db.machine()),
        db,
        stats: StabStats::default(),
        type_depth: 0,
    };

    for (index, record) in StabIter::new(stabs, big_endian).enumerate() {
        parser.stats.records += 1;
        let stab = match record {
            Ok(stab) => stab,
            Err(err) => {
                parser.stats.failed += 1;
                warn!(index, "Discarding trailing partial stab record: {err}");
                continue;
            }
        };

        let Some(kind) = stab.stab_kind() else {
            parser.stats.ignored += 1;
            trace!(index, kind = stab.kind, "Ignoring stab kind");
            continue;
        };

        let string = stab_string(strings, stab.string_index);
        let result = string.and_then(|string| parser.dispatch(kind, &stab, string));
        if let Err(err) = result {
            if err.is_fatal() {
                return Err(err);
            }

            parser.stats.failed += 1;
            let text = stab_string(strings, stab.string_index)
                .ok()
                .flatten()
                .map_or(Cow::Borrowed(""), String::from_utf8_lossy);
            warn!(
                index,
                string_index = stab.string_index,
                kind = %kind,
                other = stab.other,
                description = stab.description,
                value = format_args!("0x{:08x}", stab.value),
                string = %text,
                "Failed to parse stab: {err}"
            );
        }
    }

    // Assembly sources may never emit a closing source-file stab.
    if let Err(err) = parser.handle_source_file(None, None, false) {
        if err.is_fatal() {
            return Err(err);
        }
        warn!("Failed to close the final source file: {err}");
    }

    parser.resolve_cross_references()?;
    debug_assert!(parser.scope.is_drained(), "scope state left after the final close");

    let stats = parser.stats;
    info!(
        file = parser.db.filename(),
        records = stats.records,
        failed = stats.failed,
        ignored = stats.ignored,
        sources = parser.db.source_file_count(),
        "Parsed STABS"
    );

    Ok(stats)
}

impl StabParser<'_>
{
    fn dispatch(&mut self, kind: StabKind, stab: &RawStab, string: Option<&[u8]>) -> StabResult<()>
    {
        if kind.is_source_file() {
            let include = matches!(kind, StabKind::IncludeBegin | StabKind::IncludePlaceholder);
            return self.handle_source_file(Some((kind, stab)), string, include);
        }

        let (name, rest) = match string {
            Some(string) => {
                let (name, rest) = split_stab_name(string);
                (name, Some(rest))
            }
            None => (None, None),
        };

        match kind {
            StabKind::Function => self.handle_function(stab, name, rest),
            StabKind::FunctionParameter => self.handle_parameter(stab, name, rest),
            StabKind::RegisterVariable => self.handle_register_variable(stab, name, rest),
            StabKind::LocalSymbol => self.handle_local_symbol(stab, name, rest),
            StabKind::GlobalSymbol | StabKind::Static | StabKind::BssSymbol => self.handle_static(stab, name, rest),
            StabKind::SourceLine => self.handle_source_line(stab),
            StabKind::LeftBrace | StabKind::RightBrace => self.handle_brace(stab),
            StabKind::IncludeEnd => {
                debug!("End of include file");
                Ok(())
            }
            StabKind::SourceFile | StabKind::IncludeBegin | StabKind::IncludeName | StabKind::IncludePlaceholder => {
                Ok(())
            }
        }
    }
}
