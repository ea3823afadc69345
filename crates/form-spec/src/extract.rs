use crate::spec::content::ContentNode;

/// Collects the field names nested in a step's content, depth-first and
/// left-to-right. Nameless leaves contribute nothing.
pub fn extract_field_names(content: &[ContentNode]) -> Vec<String> {
    let mut names = Vec::new();
    collect(content, &mut names);
    names
}

fn collect(nodes: &[ContentNode], names: &mut Vec<String>) {
    for node in nodes {
        if let Some(name) = node.field_name() {
            names.push(name.to_string());
        } else {
            collect(node.children(), names);
        }
    }
}

/// Finds the first input-like node named `field`.
pub fn find_field<'a>(content: &'a [ContentNode], field: &str) -> Option<&'a ContentNode> {
    content.iter().find_map(|node| {
        if node.field_name() == Some(field) {
            Some(node)
        } else {
            find_field(node.children(), field)
        }
    })
}
