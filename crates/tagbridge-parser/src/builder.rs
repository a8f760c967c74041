//! Controller descriptor assembly for one source unit

use crate::error::ParseError;
use crate::interpreter::{interpret, Interpretation};
use tagbridge_domain::tag::MODULE_TAG;
use tagbridge_domain::{CommentParser, ControllerDescriptor, DocRecord};
use tracing::trace;

/// Group the routes of one source unit under its module name.
///
/// The first record carrying `@module` names the controller; every other
/// record goes through [`interpret`] and routable ones are kept in order.
pub fn build_controller(records: &[DocRecord]) -> Result<ControllerDescriptor, ParseError> {
    let (module_idx, module) = records
        .iter()
        .enumerate()
        .find(|(_, record)| record.is_module())
        .ok_or(ParseError::MissingModule)?;

    let name = module
        .first_tag(MODULE_TAG)
        .map(|tag| tag.string.trim().to_string())
        .unwrap_or_default();
    if name.is_empty() {
        return Err(ParseError::EmptyModuleName);
    }

    let mut methods = Vec::new();
    for (idx, record) in records.iter().enumerate() {
        if idx == module_idx {
            continue;
        }
        match interpret(record) {
            Interpretation::Route(route) => methods.push(route),
            Interpretation::NotRoutable(reason) => {
                trace!(
                    controller = %name,
                    context = record.context.as_deref().unwrap_or("<none>"),
                    "Skipping record: {}",
                    reason
                );
            }
        }
    }

    Ok(ControllerDescriptor {
        name,
        description: module.description.clone(),
        methods,
    })
}

/// Extract the records of `source` and build its controller descriptor
pub fn parse_unit<P: CommentParser>(
    parser: &P,
    source: &str,
) -> Result<ControllerDescriptor, ParseError> {
    let records = parser
        .parse_comments(source)
        .map_err(|e| ParseError::Extract(Box::new(e)))?;
    build_controller(&records)
}
