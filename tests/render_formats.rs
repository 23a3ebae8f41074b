//! Writing todo entries and lists in every output format

use doctodo::{render_with_config, Config, OutputFormat, RenderConfig};

const SOURCE: &str = "@todo \"fix X\"\n@todolist";

fn render(format: OutputFormat, config: Config) -> String {
    render_with_config(
        SOURCE,
        RenderConfig::new().with_format(format).with_config(config),
    )
    .expect("render should succeed")
}

fn included() -> Config {
    Config::default().with_value("todo", "include_annotations", true)
}

#[test]
fn test_text_output() {
    let out = render(OutputFormat::Text, included());
    insta::assert_snapshot!(out, @r"
    Todo:
       fix X

    Todo:
       fix X

    (The *original entry* is located in index.tdoc, line 1.)
    ");
}

#[test]
fn test_html_output() {
    let out = render(OutputFormat::Html, included());
    let expected = concat!(
        "<div id=\"todo-0\" class=\"admonition admonition-todo\">\n",
        "<p class=\"admonition-title\">Todo</p>\n",
        "<p>fix X</p>\n",
        "</div>\n",
        "<div class=\"admonition admonition-todo\">\n",
        "<p class=\"admonition-title\">Todo</p>\n",
        "<p>fix X</p>\n",
        "</div>\n",
        "<p class=\"todo-source\">(The <a class=\"reference internal\" href=\"#todo-0\"><em>original entry</em></a> is located in index.tdoc, line 1.)</p>\n",
    );
    pretty_assertions::assert_eq!(out, expected);
}

#[test]
fn test_latex_output() {
    let out = render(OutputFormat::Latex, included());
    assert!(out.starts_with(
        "\n\\begin{sphinxadmonition}{note}{\\label{\\detokenize{index:todo-0}}Todo:}"
    ));
    // the copy carries no label
    assert!(out.contains("\n\\begin{sphinxadmonition}{note}{Todo:}"));
    assert_eq!(out.matches("\\end{sphinxadmonition}").count(), 2);
    assert!(out.contains("\\hyperref[\\detokenize{index:todo-0}]{\\sphinxstyleemphasis{original entry}}"));
}

#[test]
fn test_man_output() {
    let out = render(OutputFormat::Man, included());
    assert_eq!(out.matches(".RS 4\n").count(), 2);
    assert_eq!(out.matches(".RE\n").count(), 2);
    assert!(out.contains("(The \\fIoriginal entry\\fP is located in index.tdoc, line 1.)"));
}

#[test]
fn test_texinfo_output() {
    let out = render(OutputFormat::Texinfo, included());
    let expected = concat!(
        "@anchor{index-todo-0}\n",
        "\n@cartouche\n@quotation Todo\n",
        "\nfix X\n",
        "@end quotation\n@end cartouche\n",
        "\n@cartouche\n@quotation Todo\n",
        "\nfix X\n",
        "@end quotation\n@end cartouche\n",
        "\n(The @ref{index-todo-0,,original entry} is located in index.tdoc, line 1.)\n",
    );
    pretty_assertions::assert_eq!(out, expected);
}

#[test]
fn test_excluded_in_every_format() {
    for format in [
        OutputFormat::Html,
        OutputFormat::Latex,
        OutputFormat::Text,
        OutputFormat::Man,
        OutputFormat::Texinfo,
    ] {
        let out = render(format, Config::default());
        assert!(out.trim().is_empty(), "{}: {:?}", format, out);
    }
}

#[test]
fn test_link_only_text() {
    let config = included().with_value("todo", "link_only", true);
    let out = render(OutputFormat::Text, config);
    assert!(out.ends_with("*original entry*\n\n"));
    assert!(!out.contains("line 1"));
}

#[test]
fn test_custom_class_in_html() {
    let out = render_with_config(
        "@todo [class: \"urgent\"] \"ship it\"",
        RenderConfig::new().with_include_annotations(true),
    )
    .unwrap();
    assert!(out.starts_with("<div id=\"todo-0\" class=\"admonition urgent\">\n"));
}
