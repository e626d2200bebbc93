/// Toolkit color slots, in device index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorId {
    Foreground,
    Background,
    BackgroundLight,
    BackgroundDark,
    Select,
    SelectBackground,
    SelectBackgroundLight,
    SelectBackgroundDark,
    SelectForeground,
    ActiveBackground,
    ActiveBackgroundLight,
    ActiveBackgroundDark,
    ActiveForeground,
    DisabledForeground,
    HighlightForeground,
    Fill,
    Transparent,
    TitleBackground,
    TitleInactive,
    TitleForeground,
    TitleBorder,
    TitleButton,
    ToolbarBackground,
    ToolbarForeground,
    ToolbarButton,
    ToolbarButtonActive,
    ShellText,
    ShellBackground,
    ToolbarHover,
    ToolbarButtonHover,
    ToolbarButtonDisabled,
    ToolbarBorder,
    ToolbarMenuBackground,
    ToolbarMenuForeground,
    ToolbarMenuSelect,
    ToolbarForegroundHover,
}

pub const COLOR_COUNT: usize = 36;

/// Profile-file key names, index-aligned with [`ColorId`].
const COLOR_NAMES: [&str; COLOR_COUNT] = [
    "foreground",
    "background",
    "background_light",
    "background_dark",
    "select",
    "select_background",
    "select_background_light",
    "select_background_dark",
    "select_foreground",
    "active_background",
    "active_background_light",
    "active_background_dark",
    "active_foreground",
    "disabled_foreground",
    "highlight_foreground",
    "fill",
    "transparent",
    "title_background",
    "title_inactive",
    "title_foreground",
    "title_border",
    "title_button",
    "toolbar_background",
    "toolbar_foreground",
    "toolbar_button",
    "toolbar_button_active",
    "shell_text",
    "shell_background",
    "toolbar_hover",
    "toolbar_btn_hover",
    "toolbar_btn_disabled",
    "toolbar_border",
    "toolbar_menu_bg",
    "toolbar_menu_fg",
    "toolbar_menu_select",
    "toolbar_fg_hover",
];

impl ColorId {
    pub const ALL: [ColorId; COLOR_COUNT] = [
        ColorId::Foreground,
        ColorId::Background,
        ColorId::BackgroundLight,
        ColorId::BackgroundDark,
        ColorId::Select,
        ColorId::SelectBackground,
        ColorId::SelectBackgroundLight,
        ColorId::SelectBackgroundDark,
        ColorId::SelectForeground,
        ColorId::ActiveBackground,
        ColorId::ActiveBackgroundLight,
        ColorId::ActiveBackgroundDark,
        ColorId::ActiveForeground,
        ColorId::DisabledForeground,
        ColorId::HighlightForeground,
        ColorId::Fill,
        ColorId::Transparent,
        ColorId::TitleBackground,
        ColorId::TitleInactive,
        ColorId::TitleForeground,
        ColorId::TitleBorder,
        ColorId::TitleButton,
        ColorId::ToolbarBackground,
        ColorId::ToolbarForeground,
        ColorId::ToolbarButton,
        ColorId::ToolbarButtonActive,
        ColorId::ShellText,
        ColorId::ShellBackground,
        ColorId::ToolbarHover,
        ColorId::ToolbarButtonHover,
        ColorId::ToolbarButtonDisabled,
        ColorId::ToolbarBorder,
        ColorId::ToolbarMenuBackground,
        ColorId::ToolbarMenuForeground,
        ColorId::ToolbarMenuSelect,
        ColorId::ToolbarForegroundHover,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<ColorId> {
        Self::ALL.get(index).copied()
    }

    pub fn from_name(name: &str) -> Option<ColorId> {
        COLOR_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| Self::ALL[i])
    }

    pub fn name(self) -> &'static str {
        COLOR_NAMES[self.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shade {
    Same,
    Light,
    Dark,
}

/// Fixed shading arithmetic on the RGB channels; alpha is untouched.
pub fn shade(rgba: u32, shade: Shade) -> u32 {
    if shade == Shade::Same {
        return rgba;
    }
    let adjust = |c: u32| match shade {
        Shade::Light => c + (255 - c) / 2,
        Shade::Dark => c * 3 / 4,
        Shade::Same => c,
    };
    let r = adjust((rgba >> 24) & 0xff);
    let g = adjust((rgba >> 16) & 0xff);
    let b = adjust((rgba >> 8) & 0xff);
    (r << 24) | (g << 16) | (b << 8) | (rgba & 0xff)
}

/// Compiled-in default: a base color plus the rule deriving the final
/// value from it.
#[derive(Debug, Clone, Copy)]
pub struct ColorDefault {
    pub base: u32,
    pub shade: Shade,
}

const fn rgb(r: u32, g: u32, b: u32) -> u32 {
    (r << 24) | (g << 16) | (b << 8) | 0xff
}

const BACK: u32 = rgb(0xdd, 0xdd, 0xdd);
const ACTIVE: u32 = rgb(0xed, 0xed, 0xed);
const SELECT_BACK: u32 = rgb(0x40, 0x40, 0x40);

/// Index-aligned with [`ColorId`].
pub const DEFAULTS: [ColorDefault; COLOR_COUNT] = [
    ColorDefault { base: rgb(0x00, 0x00, 0x00), shade: Shade::Same }, // foreground
    ColorDefault { base: BACK, shade: Shade::Same },
    ColorDefault { base: BACK, shade: Shade::Light },
    ColorDefault { base: BACK, shade: Shade::Dark },
    ColorDefault { base: rgb(0xb0, 0x30, 0x60), shade: Shade::Same }, // select
    ColorDefault { base: SELECT_BACK, shade: Shade::Same },
    ColorDefault { base: SELECT_BACK, shade: Shade::Light },
    ColorDefault { base: SELECT_BACK, shade: Shade::Dark },
    ColorDefault { base: rgb(0xff, 0xff, 0xff), shade: Shade::Same }, // select_foreground
    ColorDefault { base: ACTIVE, shade: Shade::Same },
    ColorDefault { base: ACTIVE, shade: Shade::Light },
    ColorDefault { base: ACTIVE, shade: Shade::Dark },
    ColorDefault { base: rgb(0x00, 0x00, 0x00), shade: Shade::Same }, // active_foreground
    ColorDefault { base: rgb(0x88, 0x88, 0x88), shade: Shade::Same }, // disabled_foreground
    ColorDefault { base: rgb(0x00, 0x00, 0x00), shade: Shade::Same }, // highlight_foreground
    ColorDefault { base: BACK, shade: Shade::Same },                  // fill
    ColorDefault { base: 0x0000_0000, shade: Shade::Same },           // transparent
    ColorDefault { base: rgb(0x41, 0x69, 0xe1), shade: Shade::Same }, // title_background
    ColorDefault { base: rgb(0xd3, 0xd3, 0xd3), shade: Shade::Same }, // title_inactive
    ColorDefault { base: rgb(0xff, 0xff, 0xff), shade: Shade::Same }, // title_foreground
    ColorDefault { base: rgb(0x30, 0x30, 0x30), shade: Shade::Same }, // title_border
    ColorDefault { base: rgb(0xf0, 0xf0, 0xf0), shade: Shade::Same }, // title_button
    ColorDefault { base: BACK, shade: Shade::Same },                  // toolbar_background
    ColorDefault { base: rgb(0x00, 0x00, 0x00), shade: Shade::Same }, // toolbar_foreground
    ColorDefault { base: rgb(0xe0, 0xe0, 0xe0), shade: Shade::Same }, // toolbar_button
    ColorDefault { base: rgb(0xc0, 0xc0, 0xc0), shade: Shade::Same }, // toolbar_button_active
    ColorDefault { base: rgb(0x00, 0x00, 0x00), shade: Shade::Same }, // shell_text
    ColorDefault { base: rgb(0xff, 0xff, 0xff), shade: Shade::Same }, // shell_background
    ColorDefault { base: rgb(0xe8, 0xe8, 0xe8), shade: Shade::Same }, // toolbar_hover
    ColorDefault { base: rgb(0xee, 0xee, 0xee), shade: Shade::Same }, // toolbar_btn_hover
    ColorDefault { base: rgb(0xbb, 0xbb, 0xbb), shade: Shade::Same }, // toolbar_btn_disabled
    ColorDefault { base: rgb(0xaa, 0xaa, 0xaa), shade: Shade::Same }, // toolbar_border
    ColorDefault { base: rgb(0xff, 0xff, 0xff), shade: Shade::Same }, // toolbar_menu_bg
    ColorDefault { base: rgb(0x00, 0x00, 0x00), shade: Shade::Same }, // toolbar_menu_fg
    ColorDefault { base: rgb(0x41, 0x69, 0xe1), shade: Shade::Same }, // toolbar_menu_select
    ColorDefault { base: rgb(0x00, 0x00, 0x00), shade: Shade::Same }, // toolbar_fg_hover
];

/// The resolved compiled-in default for a slot. Store initialization and
/// cache backfill both come through here, so they cannot disagree.
pub fn default_rgba(id: ColorId) -> u32 {
    let d = DEFAULTS[id.index()];
    shade(d.base, d.shade)
}

/// Parses the `#RRGGBBAA` text form. Leading/trailing whitespace is
/// tolerated, digits after the first eight are not, trailing non-hex
/// text is ignored.
pub fn parse_rgba(text: &str) -> Option<u32> {
    let hex = text.trim().strip_prefix('#')?;
    let end = hex
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(hex.len());
    let digits = &hex[..end];
    if digits.is_empty() || digits.len() > 8 {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

pub fn format_rgba(rgba: u32) -> String {
    format!("#{rgba:08X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_indices_round_trip() {
        for (i, id) in ColorId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(ColorId::from_index(i), Some(*id));
            assert_eq!(ColorId::from_name(id.name()), Some(*id));
        }
        assert_eq!(ColorId::from_index(COLOR_COUNT), None);
        assert_eq!(ColorId::from_name("no_such_color"), None);
    }

    #[test]
    fn shade_arithmetic() {
        let base = rgb(0xdd, 0xdd, 0xdd);
        assert_eq!(shade(base, Shade::Same), base);
        assert_eq!(shade(base, Shade::Light), rgb(0xee, 0xee, 0xee));
        assert_eq!(shade(base, Shade::Dark), rgb(0xa5, 0xa5, 0xa5));

        // Alpha channel passes through.
        assert_eq!(shade(0x40404080, Shade::Light), 0x9f9f9f80);
    }

    #[test]
    fn derived_defaults_resolve_through_shading() {
        assert_eq!(default_rgba(ColorId::Background), rgb(0xdd, 0xdd, 0xdd));
        assert_eq!(
            default_rgba(ColorId::BackgroundLight),
            shade(rgb(0xdd, 0xdd, 0xdd), Shade::Light)
        );
        assert_eq!(default_rgba(ColorId::Transparent), 0);
    }

    #[test]
    fn rgba_text_round_trip() {
        assert_eq!(parse_rgba("#FF0000FF"), Some(0xff0000ff));
        assert_eq!(parse_rgba("  #4169E1FF\n"), Some(0x4169e1ff));
        assert_eq!(parse_rgba(&format_rgba(0x12345678)), Some(0x12345678));
    }

    #[test]
    fn malformed_rgba_text() {
        assert_eq!(parse_rgba("FF0000FF"), None);
        assert_eq!(parse_rgba("#"), None);
        assert_eq!(parse_rgba("#GGGGGGGG"), None);
        assert_eq!(parse_rgba("#112233445"), None);
        // Short forms and trailing junk follow the permissive device
        // parser.
        assert_eq!(parse_rgba("#ff"), Some(0xff));
        assert_eq!(parse_rgba("#FF0000FF extra"), Some(0xff0000ff));
    }
}
