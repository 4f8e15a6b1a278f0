use crate::layout::OutputLayout;
use drvpack_schema::CategoryName;

/// Lines that install each prerequisite before the category itself.
pub fn dependency_block(layout: &OutputLayout, dependencies: &[CategoryName]) -> Vec<String> {
    dependencies
        .iter()
        .flat_map(|dep| {
            [
                format!("echo \"installing '{dep}'\""),
                format!("source {}", layout.category_script(dep).display()),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_each_dependency_in_order() {
        let layout = OutputLayout::new("/out");
        let deps = [CategoryName::from("gl.native"), CategoryName::from("gl.compat32")];
        assert_eq!(
            dependency_block(&layout, &deps),
            vec![
                "echo \"installing 'gl.native'\"",
                "source /out/c/gl.native/install.sh",
                "echo \"installing 'gl.compat32'\"",
                "source /out/c/gl.compat32/install.sh",
            ]
        );
    }

    #[test]
    fn no_dependencies_no_lines() {
        assert!(dependency_block(&OutputLayout::new("/out"), &[]).is_empty());
    }
}
