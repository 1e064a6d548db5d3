#[cfg(test)]
#[path = "mode_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

pub struct Preset {
    pub label: &'static str,
    pub prompt: &'static str,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumVariantNames,
    strum::Display,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Full, self-contained HTML/JS page.
    Html,
    /// Low fidelity SVG wireframe.
    Wireframe,
    /// Animated CSS background.
    Background,
    /// Redesign of pasted frontend code.
    Refactor,
    /// Redesign of an existing page or Figma frame.
    Clone,
}

impl Default for OutputMode {
    fn default() -> OutputMode {
        return OutputMode::Html;
    }
}

impl OutputMode {
    pub fn parse(text: &str) -> Option<OutputMode> {
        return OutputMode::iter().find(|e| return e.to_string() == text);
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputMode::Html => return "HTML/JS",
            OutputMode::Wireframe => return "UI Wireframe",
            OutputMode::Background => return "Background",
            OutputMode::Refactor => return "Code Refactor",
            OutputMode::Clone => return "Clone & Refactor",
        }
    }

    /// Highlighting syntax of the generated source.
    pub fn syntax(&self) -> &'static str {
        if *self == OutputMode::Wireframe {
            return "xml";
        }

        return "html";
    }

    pub fn file_extension(&self) -> &'static str {
        if *self == OutputMode::Wireframe {
            return "svg";
        }

        return "html";
    }

    /// Display title of the nth (1 based) output of a round.
    pub fn title(&self, n: usize) -> String {
        match self {
            OutputMode::Html => return format!("Code {n}"),
            OutputMode::Wireframe => return format!("Wireframe {n}"),
            OutputMode::Background => return format!("Background {n}"),
            OutputMode::Refactor => return format!("Refactored Code {n}"),
            OutputMode::Clone => return format!("Cloned {n}"),
        }
    }

    /// Message shown when a submission has nothing to send for this mode.
    pub fn empty_prompt_message(&self) -> &'static str {
        match self {
            OutputMode::Clone => return "Please describe your desired changes.",
            OutputMode::Refactor => return "Please paste your code to refactor.",
            _ => return "Please enter a prompt.",
        }
    }

    pub fn system_instruction(&self) -> String {
        let text = match self {
            OutputMode::Html => HTML_INSTRUCTION,
            OutputMode::Wireframe => WIREFRAME_INSTRUCTION,
            OutputMode::Background => BACKGROUND_INSTRUCTION,
            OutputMode::Refactor => REFACTOR_INSTRUCTION,
            OutputMode::Clone => CLONE_INSTRUCTION,
        };

        return text.trim().to_string();
    }

    pub fn presets(&self) -> &'static [Preset] {
        match self {
            OutputMode::Html => return HTML_PRESETS,
            OutputMode::Wireframe => return WIREFRAME_PRESETS,
            OutputMode::Background => return BACKGROUND_PRESETS,
            OutputMode::Refactor => return REFACTOR_PRESETS,
            OutputMode::Clone => return &[],
        }
    }
}

const HTML_INSTRUCTION: &str = r#"
You are a world-class UI/UX designer and frontend developer with an aesthetic sense comparable to designers at Stripe, Vercel, and Figma. Your task is to generate a single, self-contained HTML file that implements a UI based on the user's prompt.

**Core Principles:**
- **Aesthetic Excellence:** Create visually stunning designs. Use sophisticated color palettes (avoiding harsh, default colors), modern typography, and ample whitespace.
- **Modern & Responsive:** The UI must be fully responsive and look flawless on all screen sizes. Utilize modern CSS like Flexbox and Grid.
- **Micro-interactions:** Enhance the user experience with subtle, purposeful animations and transitions (e.g., hover effects, loading states).
- **Accessibility:** Write clean, semantic, and accessible HTML (e.g., use proper tags, ARIA attributes where necessary).

**Technical Constraints:**
- **Self-Contained:** ALL CSS and JavaScript must be inlined within the single HTML file.
- **No External Dependencies:** Do not use external libraries, frameworks, or assets (no images, fonts from URLs, etc.). Use placeholder content where needed.

Your final output must be ONLY the raw HTML code. Do not include any surrounding text, explanations, or markdown code fences like ```html.
"#;

const WIREFRAME_INSTRUCTION: &str = r#"
You are a UI/UX designer specializing in creating low-fidelity wireframes. Your task is to generate a wireframe based on the user's prompt.

**Core Principles:**
- **Low-Fidelity:** Focus on structure, layout, and placement of elements. Do not add color, styling, or detailed graphics.
- **Clarity and Simplicity:** Use basic shapes like rectangles, circles, and lines.
- **Placeholders:** Represent images with a rectangle containing two crossed lines. Represent text with simple labels (e.g., "Username") or placeholder text like "Lorem ipsum...". Use dashed lines for placeholder containers.

**Technical Constraints:**
- **SVG Output:** The output MUST be a single, self-contained SVG file. Set a standard desktop viewport like `viewBox="0 0 1024 768"`.
- **Monochrome:** Use only black for lines/text (#000), white for backgrounds (#FFF), and light gray (#E0E0E0) for fills.
- **Basic Elements:** Use only basic SVG elements: `<svg>`, `<g>`, `<rect>`, `<circle>`, `<line>`, `<path>`, `<text>`.

**Crucially, your entire response must be ONLY the raw SVG code. Do not include any surrounding text, explanations, or markdown code fences like ```svg.**
"#;

const BACKGROUND_INSTRUCTION: &str = r#"
You are a digital artist and CSS expert specializing in creating beautiful, dynamic, animated backgrounds. When given a prompt, you must generate a single, self-contained HTML file with a `<body>` tag that has the described gradient or pattern as its background.

**Core Principles:**
- **Artistic & Dynamic:** Do not create static backgrounds. Use CSS animations (`@keyframes`) to make the background subtly shift, pulse, or evolve over time.
- **Sophisticated Gradients:** Use multiple, layered gradients (`linear-gradient`, `radial-gradient`, `conic-gradient`) to create depth and complexity.
- **Performance:** Ensure animations are smooth and performant (e.g., by animating `transform` or `opacity`).

**Technical Constraints:**
- **Self-Contained:** All CSS must be inlined within a `<style>` tag. The HTML should be minimal.
- **No External Dependencies:** No external libraries, frameworks, or assets.

Your final output should be ONLY the raw HTML code. Do not include any surrounding text, explanations, or markdown code fences like ```html.
"#;

const REFACTOR_INSTRUCTION: &str = r#"
You are a world-class senior frontend engineer and UI/UX designer with a keen eye for aesthetics. You will be given a snippet of frontend code (HTML, CSS, JavaScript). Your task is to perform a **dramatic transformation**, refactoring it into a stunning, modern, and responsive UI.

**Your goals are:**
1. **Aesthetic Revolution:** This is not a cleanup; it's a complete redesign. Introduce a sophisticated color scheme, elegant typography, and fluid, purposeful animations.
2. **Modern Best Practices:** The final code must be clean, semantic, accessible, and responsive across all devices.
3. **Preserve Functionality:** The core purpose of the original code should be preserved and enhanced, not lost.

**Technical Constraints:**
- **Self-Contained:** The final output must be a single, self-contained HTML file. All CSS and JavaScript must be inlined.
- **No External Dependencies:** Do not use external libraries, frameworks, or assets.

Your final output should be ONLY the raw HTML code. Do not include any surrounding text, explanations, or markdown code fences like ```html.
"#;

const CLONE_INSTRUCTION: &str = r#"
You are a world-class senior frontend engineer and UI/UX designer. Your task is to generate a single, self-contained HTML file based on the user's input.
The input will be either:
1. The HTML from an existing webpage and a prompt with instructions for modification.
2. An image of a Figma design and a prompt with instructions for implementation.

**Core Principles:**
- **Follow Instructions:** Adhere strictly to the user's instructions (e.g., "make it dark mode", "simplify the layout", "implement this design").
- **Aesthetic Excellence:** Transform the design into something visually stunning. Use sophisticated color palettes, modern typography, and ample whitespace.
- **Content Preservation (for HTML):** If given HTML, preserve the original text and high-level structure, but completely overhaul the styling and layout.
- **Pixel-Perfect Implementation (for Images):** If given an image, create a responsive HTML/CSS implementation that is a faithful representation of the design.

**Technical Constraints:**
- **Self-Contained:** The final output must be a single HTML file. All CSS and JavaScript must be inlined.
- **No External Dependencies:** Do not link to external assets. If you need placeholder images, generate them using SVG.

Your final output must be ONLY the raw HTML code. Do not include any surrounding text, explanations, or markdown code fences like ```html.
"#;

const HTML_PRESETS: &[Preset] = &[
    Preset {
        label: "weather app",
        prompt: "a simulated weather app with a clean, modern UI",
    },
    Preset {
        label: "todo list",
        prompt: "a todo list app with add, delete, and complete functionality",
    },
    Preset {
        label: "SaaS landing page",
        prompt: "a modern SaaS landing page with a hero section, feature list, and pricing table",
    },
    Preset {
        label: "calculator",
        prompt: "a stylish, functional calculator",
    },
    Preset {
        label: "login form",
        prompt: "a login form with input validation and a sleek design",
    },
    Preset {
        label: "memory game",
        prompt: "a memory game with a card flipping animation",
    },
];

const WIREFRAME_PRESETS: &[Preset] = &[
    Preset {
        label: "e-commerce product page",
        prompt: "a wireframe for an e-commerce product page with a main image, thumbnails, product description, and add to cart button",
    },
    Preset {
        label: "mobile app dashboard",
        prompt: "a wireframe for a mobile fitness app dashboard showing daily stats, weekly progress chart, and recent activities",
    },
    Preset {
        label: "login and registration screen",
        prompt: "a wireframe for a login and registration screen with input fields, social login options, and a submit button",
    },
];

const BACKGROUND_PRESETS: &[Preset] = &[
    Preset {
        label: "forest canopy",
        prompt: "an animated gradient that looks like sunlight filtering through a forest canopy",
    },
    Preset {
        label: "molten lava",
        prompt: "a fiery, animated gradient of molten lava with reds, oranges, and yellows",
    },
];

const REFACTOR_PRESETS: &[Preset] = &[
    Preset {
        label: "basic form",
        prompt: "<form>\n  <input type=\"text\" id=\"name\" name=\"name\"><br>\n  <input type=\"email\" id=\"email\" name=\"email\"><br>\n  <input type=\"submit\" value=\"Submit\">\n</form>",
    },
    Preset {
        label: "simple card",
        prompt: "<div class=\"card\">\n  <h2>Card Title</h2>\n  <p>This is some text content for the card.</p>\n  <button>Learn More</button>\n</div>",
    },
];
