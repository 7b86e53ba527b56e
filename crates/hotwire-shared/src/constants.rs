/// Default port of a Hotline-style server's control connection.
pub const DEFAULT_SERVER_PORT: u16 = 5500;

/// Transfer connections listen one port above the control connection.
pub const TRANSFER_PORT_OFFSET: u16 = 1;

/// Default port of a tracker directory service.
pub const DEFAULT_TRACKER_PORT: u16 = 5498;

/// Icon shown for users that never picked one.
pub const DEFAULT_ICON_ID: u16 = 414;

/// Flavor requested for plain-text news articles.
pub const TEXT_FLAVOR: &str = "text/plain";

/// Emoji stand-in for a classic client icon id, for hosts without the
/// classic icon artwork.
pub fn icon_emoji(icon_id: u16) -> Option<&'static str> {
    let emoji = match icon_id {
        414 => "🙂",
        2000 => "📟",
        2001 => "💀",
        2002 => "🪩",
        2003 => "💥",
        2004 => "🐞",
        2014 => "🍎",
        2006 => "💠",
        2007 => "🦠",
        2008 => "🪀",
        2009 => "🛟",
        2010 => "🍉",
        2011 => "🍁",
        2012 => "🚦",
        145 => "🚔",
        2015 => "👻",
        2016 => "💻",
        2017 => "☀️",
        2018 => "➡️",
        417 => "🧍‍♂️",
        140 => "🎨",
        141 => "👽",
        142 | 144 => "🚀",
        143 => "🕷️",
        138 => "😺",
        146 => "🌅",
        149 => "🐮",
        150 => "🦖",
        151 => "🧻",
        154 => "🐖",
        182 => "✋",
        207 | 2037 => "⚠️",
        2061 => "☕️",
        2063 => "🌮",
        2064 => "🍕",
        2065 => "🍔",
        2066 => "🌭",
        2067 => "🍭",
        2013 => "🐧",
        2055 => "⚡️",
        2400 | 2555 => "🇨🇦",
        2036 => "☣️",
        4134 => "🦈",
        4247 => "🍗",
        135 => "☯️",
        137 => "🐝",
        165 => "🎶",
        166 => "❤️",
        2549 => "🇮🇱",
        2553 => "🇺🇸",
        2552 => "🇮🇳",
        2556 => "🇦🇺",
        2565 => "🇬🇧",
        2567 => "🇯🇵",
        2566 => "🇫🇷",
        2564 => "🇩🇪",
        2563 => "🇮🇹",
        2550 => "🇭🇺",
        2551 => "🇵🇱",
        2560 => "🇪🇸",
        2561 => "🇸🇪",
        _ => return None,
    };
    Some(emoji)
}
