use std::collections::HashMap;

use tracing::debug;

use crate::constants::LineNumber;
use crate::parser::line::LineContent;
use crate::parser::location::Located;

pub(crate) type Labels<'a> = HashMap<&'a str, LineNumber>;

/// Map every declared label to the line following its declaration
///
/// This has to run over the whole program before any jump is compiled, since jumps may target
/// labels declared further down. A label declared twice points to its last declaration.
#[tracing::instrument(skip(lines))]
pub(crate) fn resolve_labels<'a>(lines: &[Located<LineContent<'a>>]) -> Labels<'a> {
    let mut labels = Labels::new();

    for (line, content) in lines.iter().enumerate() {
        if let LineContent::Label(label) = content.inner {
            let target = line + 1;
            if let Some(previous) = labels.insert(label, target) {
                debug!(label, previous, target, "Label redefined");
            }
        }
    }

    debug!(?labels, "Resolved labels");
    labels
}
