//! Prompt Composer.
//!
//! Builds the exact message list submitted to the model: a fixed,
//! versioned framing message declaring the envelope protocol, followed by
//! the prior conversation and the new user turn. Pure transformation, no
//! side effects.

use crate::supported_models::SupportedModel;
use appforge_core::envelope::ENVELOPE_TAG;
use appforge_core::session::Message;
use once_cell::sync::Lazy;

/// Version tag of the framing instruction set. Bump when the protocol
/// framing changes so transcripts can be attributed to a prompt revision.
pub const PROMPT_VERSION: &str = "2024-11-1";

/// A pre-built UI primitive the model may reference: name, import form,
/// and a usage example.
pub struct UiPrimitive {
    pub name: &'static str,
    pub import_docs: &'static str,
    pub usage_docs: &'static str,
}

/// The fixed catalog of pre-built UI primitives available to generated
/// components.
pub const UI_PRIMITIVES: &[UiPrimitive] = &[
    UiPrimitive {
        name: "Avatar",
        import_docs: r#"import { Avatar, AvatarFallback, AvatarImage } from "/components/ui/avatar";"#,
        usage_docs: r#"<Avatar>
  <AvatarImage src="https://github.com/nutlope.png" />
  <AvatarFallback>CN</AvatarFallback>
</Avatar>"#,
    },
    UiPrimitive {
        name: "Button",
        import_docs: r#"import { Button } from "/components/ui/button""#,
        usage_docs: r#"<Button>A normal button</Button>
<Button variant='secondary'>Button</Button>
<Button variant='destructive'>Button</Button>
<Button variant='outline'>Button</Button>
<Button variant='ghost'>Button</Button>
<Button variant='link'>Button</Button>"#,
    },
    UiPrimitive {
        name: "Card",
        import_docs: r#"import {
  Card,
  CardContent,
  CardDescription,
  CardFooter,
  CardHeader,
  CardTitle,
} from "/components/ui/card""#,
        usage_docs: r#"<Card>
  <CardHeader>
    <CardTitle>Card Title</CardTitle>
    <CardDescription>Card Description</CardDescription>
  </CardHeader>
  <CardContent>
    <p>Card Content</p>
  </CardContent>
  <CardFooter>
    <p>Card Footer</p>
  </CardFooter>
</Card>"#,
    },
    UiPrimitive {
        name: "Checkbox",
        import_docs: r#"import { Checkbox } from "/components/ui/checkbox""#,
        usage_docs: "<Checkbox />",
    },
    UiPrimitive {
        name: "Input",
        import_docs: r#"import { Input } from "/components/ui/input""#,
        usage_docs: "<Input />",
    },
    UiPrimitive {
        name: "Label",
        import_docs: r#"import { Label } from "/components/ui/label""#,
        usage_docs: r#"<Label htmlFor="email">Your email address</Label>"#,
    },
    UiPrimitive {
        name: "RadioGroup",
        import_docs: r#"import { Label } from "/components/ui/label"
import { RadioGroup, RadioGroupItem } from "/components/ui/radio-group""#,
        usage_docs: r#"<RadioGroup defaultValue="option-one">
  <div className="flex items-center space-x-2">
    <RadioGroupItem value="option-one" id="option-one" />
    <Label htmlFor="option-one">Option One</Label>
  </div>
  <div className="flex items-center space-x-2">
    <RadioGroupItem value="option-two" id="option-two" />
    <Label htmlFor="option-two">Option Two</Label>
  </div>
</RadioGroup>"#,
    },
    UiPrimitive {
        name: "Select",
        import_docs: r#"import {
  Select,
  SelectContent,
  SelectItem,
  SelectTrigger,
  SelectValue,
} from "/components/ui/select""#,
        usage_docs: r#"<Select>
  <SelectTrigger className="w-[180px]">
    <SelectValue placeholder="Theme" />
  </SelectTrigger>
  <SelectContent>
    <SelectItem value="light">Light</SelectItem>
    <SelectItem value="dark">Dark</SelectItem>
    <SelectItem value="system">System</SelectItem>
  </SelectContent>
</Select>"#,
    },
    UiPrimitive {
        name: "Textarea",
        import_docs: r#"import { Textarea } from "/components/ui/textarea""#,
        usage_docs: "<Textarea />",
    },
];

/// The framing instruction set, assembled once.
pub static SYSTEM_PROMPT: Lazy<String> = Lazy::new(build_system_prompt);

fn build_system_prompt() -> String {
    let mut prompt = format!(
        r#"You are an expert frontend engineer. Build exactly one self-contained React component for the user's request.

Output protocol (follow it exactly):
- Wrap your entire output in a single <{tag} name="APP_NAME" icon="ICON_NAME"> ... </{tag}> pair. The name attribute is a short human-readable app name; the icon attribute names one lucide icon.
- Output nothing outside that pair. Never use markdown code fences anywhere.
- The component must be the default export, take no required props, and compile as-is.

Requirements for the component:
- Fill the full screen and stay responsive (h-screen / w-full layout).
- Pair every light style with a dark variant (bg-white dark:bg-black and the like) so the app adapts to the active theme.
- Persist interactive state to localStorage so the app survives a reload.
- Implement every feature completely. No placeholders, no TODOs, no stubbed handlers.

You may use the following pre-built components:
"#,
        tag = ENVELOPE_TAG
    );

    for primitive in UI_PRIMITIVES {
        prompt.push_str(&format!(
            "\n{name}\nImport:\n{import}\nUsage:\n{usage}\n",
            name = primitive.name,
            import = primitive.import_docs,
            usage = primitive.usage_docs,
        ));
    }

    prompt
}

/// Builds the message list for one turn.
///
/// Output is `[framing message] + history + new user message`. When the
/// target model cannot accept image input, image parts are stripped from
/// every message, prior turns included: stale image references must never
/// reach an incapable model.
pub fn compose(
    history: &[Message],
    user_text: &str,
    staged_image: Option<&str>,
    model: &SupportedModel,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(SYSTEM_PROMPT.as_str()));
    messages.extend_from_slice(history);

    let mut user_message = Message::user_uncorrelated(user_text);
    if let Some(image) = staged_image {
        user_message = user_message.with_image(image);
    }
    messages.push(user_message);

    if !model.is_vision_enabled {
        for message in &mut messages {
            if message.has_image() {
                *message = message.without_images();
            }
        }
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supported_models::{SUPPORTED_MODELS, find_model};

    fn vision_model() -> &'static SupportedModel {
        find_model("Llama-3.2-90B-Vision-Instruct").unwrap()
    }

    fn text_model() -> &'static SupportedModel {
        &SUPPORTED_MODELS[0]
    }

    #[test]
    fn framing_message_comes_first_and_declares_the_protocol() {
        let messages = compose(&[], "make a timer", None, text_model());
        assert_eq!(messages.len(), 2);
        let framing = messages[0].text();
        assert!(framing.contains("<appArtifact name=\"APP_NAME\" icon=\"ICON_NAME\">"));
        assert!(framing.contains("Never use markdown code fences"));
        assert!(framing.contains("localStorage"));
        assert!(framing.contains("dark:"));
        // the full primitive catalog is present
        for primitive in UI_PRIMITIVES {
            assert!(framing.contains(primitive.name));
        }
    }

    #[test]
    fn staged_image_is_attached_for_vision_models() {
        let messages = compose(&[], "copy this", Some("data:image/png;base64,AA"), vision_model());
        assert!(messages.last().unwrap().has_image());
    }

    #[test]
    fn images_are_stripped_from_all_messages_for_text_models() {
        let history = vec![
            Message::user("like this screenshot", "c1").with_image("data:image/png;base64,AA"),
            Message::assistant("<appArtifact ...>", "c1"),
        ];
        let messages = compose(
            &history,
            "tweak it",
            Some("data:image/png;base64,BB"),
            text_model(),
        );
        assert!(messages.iter().all(|m| !m.has_image()));
        // text parts preserved verbatim
        assert_eq!(messages[1].text(), "like this screenshot");
    }

    #[test]
    fn history_is_preserved_in_order() {
        let history = vec![
            Message::user("first", "c1"),
            Message::assistant("reply", "c1"),
        ];
        let messages = compose(&history, "second", None, text_model());
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].text(), "first");
        assert_eq!(messages[2].text(), "reply");
        assert_eq!(messages[3].text(), "second");
    }
}
