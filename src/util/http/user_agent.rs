use rand::Rng;

const FIREFOX_VERSIONS: [&str; 10] = [
    "133.0", "132.0", "131.0", "130.0", "129.0", "128.0", "127.0", "126.0", "125.0", "124.0",
];

const CHROME_VERSIONS: [&str; 10] = [
    "133.0.6943.50",
    "132.0.6834.83",
    "131.0.6778.85",
    "130.0.6723.92",
    "129.0.6668.70",
    "128.0.6613.120",
    "127.0.6533.88",
    "126.0.6478.126",
    "125.0.6422.141",
    "124.0.6367.201",
];

const EDGE_VERSIONS: [&str; 8] = [
    "133.0.3048.56",
    "132.0.2957.55",
    "131.0.2903.86",
    "130.0.2849.68",
    "129.0.2792.52",
    "128.0.2739.79",
    "127.0.2651.98",
    "126.0.2592.87",
];

const OS_STRINGS: [&str; 6] = [
    "Windows NT 10.0; Win64; x64",
    "Windows NT 11.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "Macintosh; Intel Mac OS X 14_3",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux x86_64",
];

fn gen_chrome_ua() -> String {
    let mut rng = rand::rng();
    let os = OS_STRINGS[rng.random_range(0..OS_STRINGS.len())];
    let version = CHROME_VERSIONS[rng.random_range(0..CHROME_VERSIONS.len())];

    format!(
        "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
        os, version
    )
}

fn gen_firefox_ua() -> String {
    let mut rng = rand::rng();
    let os = OS_STRINGS[rng.random_range(0..OS_STRINGS.len())];
    let version = FIREFOX_VERSIONS[rng.random_range(0..FIREFOX_VERSIONS.len())];

    format!(
        "Mozilla/5.0 ({}; rv:{}) Gecko/20100101 Firefox/{}",
        os, version, version
    )
}

fn gen_edge_ua() -> String {
    let mut rng = rand::rng();
    let os = OS_STRINGS[rng.random_range(0..OS_STRINGS.len())];
    let version = EDGE_VERSIONS[rng.random_range(0..EDGE_VERSIONS.len())];
    let chrome = CHROME_VERSIONS[rng.random_range(0..CHROME_VERSIONS.len())];

    format!(
        "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36 Edg/{}",
        os, chrome, version
    )
}

/// Generates a plausible browser User-Agent, weighted roughly by market share.
pub fn gen_random_ua() -> String {
    let mut rng = rand::rng();
    match rng.random_range(0..10) {
        0..=5 => gen_chrome_ua(),
        6..=7 => gen_firefox_ua(),
        8 => gen_edge_ua(),
        _ => gen_chrome_ua(),
    }
}
