//! Random DNS-compliant resource names.

use rand::Rng;

/// Prefix used when none is given.
pub const DEFAULT_NAME_PREFIX: &str = "sendlive";

/// Number of random words used when none is given.
pub const DEFAULT_NAME_WORDS: usize = 3;

const WORDS: &[&str] = &[
    "amber", "anchor", "apple", "arrow", "aspen", "atlas", "autumn", "badger", "basil", "beacon",
    "birch", "bison", "blossom", "bramble", "breeze", "brook", "cactus", "canyon", "cedar",
    "cherry", "cinder", "clover", "cobalt", "comet", "coral", "cosmos", "cotton", "coyote",
    "crane", "crystal", "cypress", "dahlia", "daisy", "delta", "desert", "dune", "eagle", "echo",
    "ember", "falcon", "fern", "fjord", "flint", "forest", "fox", "frost", "galaxy", "garnet",
    "geyser", "glacier", "granite", "grove", "harbor", "hazel", "heron", "hollow", "horizon",
    "indigo", "iris", "island", "ivory", "jade", "jasper", "juniper", "kelp", "kestrel", "lagoon",
    "lantern", "larch", "lava", "lemon", "lilac", "lotus", "lynx", "magnet", "maple", "marble",
    "meadow", "mesa", "meteor", "mint", "mist", "moss", "nebula", "nectar", "nova", "oak",
    "ocean", "olive", "onyx", "orbit", "orchid", "osprey", "otter", "pebble", "pepper", "pine",
    "planet", "plume", "polar", "poppy", "prairie", "quartz", "quill", "raven", "reef", "ridge",
    "river", "robin", "saffron", "sage", "salmon", "sierra", "silver", "slate", "sparrow",
    "spruce", "summit", "sunset", "swift", "thistle", "thunder", "tide", "timber", "topaz",
    "tundra", "tulip", "valley", "velvet", "violet", "walnut", "willow", "winter", "wren",
    "zephyr",
];

/// Generates `<prefix>-<word>-...-<word>` with `num_words` random words.
///
/// Every word is lower-case ASCII, so the result is a valid bucket name
/// whenever `prefix` is. Names are random, not guaranteed unique.
pub fn generate_dns_compliant_name(prefix: &str, num_words: usize) -> String {
    let mut rng = rand::rng();

    let mut parts = Vec::with_capacity(num_words + 1);
    parts.push(prefix);
    for _ in 0..num_words {
        parts.push(WORDS[rng.random_range(0..WORDS.len())]);
    }

    parts.join("-")
}
