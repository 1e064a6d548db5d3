use strum::IntoEnumIterator;

use super::OutputMode;

#[test]
fn it_parses_mode_names() {
    assert_eq!(OutputMode::parse("html"), Some(OutputMode::Html));
    assert_eq!(OutputMode::parse("wireframe"), Some(OutputMode::Wireframe));
    assert_eq!(OutputMode::parse("clone"), Some(OutputMode::Clone));
    assert_eq!(OutputMode::parse("HTML/JS"), None);
    assert_eq!(OutputMode::parse(""), None);
}

#[test]
fn it_defaults_to_html() {
    assert_eq!(OutputMode::default(), OutputMode::Html);
}

#[test]
fn it_renders_wireframes_as_svg() {
    assert_eq!(OutputMode::Wireframe.file_extension(), "svg");
    assert_eq!(OutputMode::Wireframe.syntax(), "xml");

    for mode in OutputMode::iter().filter(|e| return *e != OutputMode::Wireframe) {
        assert_eq!(mode.file_extension(), "html");
        assert_eq!(mode.syntax(), "html");
    }
}

#[test]
fn it_titles_outputs() {
    assert_eq!(OutputMode::Html.title(1), "Code 1");
    assert_eq!(OutputMode::Wireframe.title(2), "Wireframe 2");
    assert_eq!(OutputMode::Background.title(3), "Background 3");
    assert_eq!(OutputMode::Refactor.title(4), "Refactored Code 4");
    assert_eq!(OutputMode::Clone.title(5), "Cloned 5");
}

#[test]
fn it_has_a_trimmed_instruction_for_every_mode() {
    for mode in OutputMode::iter() {
        let instruction = mode.system_instruction();
        assert!(!instruction.is_empty());
        assert_eq!(instruction, instruction.trim());
    }

    assert!(OutputMode::Wireframe
        .system_instruction()
        .contains("single, self-contained SVG file"));
}

#[test]
fn it_asks_for_the_right_input_when_empty() {
    insta::assert_snapshot!(OutputMode::Refactor.empty_prompt_message(), @"Please paste your code to refactor.");
    insta::assert_snapshot!(OutputMode::Clone.empty_prompt_message(), @"Please describe your desired changes.");
    insta::assert_snapshot!(OutputMode::Html.empty_prompt_message(), @"Please enter a prompt.");
}

#[test]
fn it_has_presets_for_every_mode_but_clone() {
    assert!(OutputMode::Clone.presets().is_empty());
    assert_eq!(OutputMode::Html.presets().len(), 6);
    assert!(OutputMode::Refactor.presets()[0].prompt.starts_with("<form>"));
}
