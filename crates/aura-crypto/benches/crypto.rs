use aura_core::KeyOrigin;
use aura_crypto::{cipher, derive_key, open, seal, DeviceSecret, Iv, Salt};
use secrecy::SecretString;

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

fn test_secret() -> DeviceSecret {
    DeviceSecret::new(SecretString::from("bench-device-secret"), KeyOrigin::Stored)
}

#[divan::bench]
fn bench_derive_key(bencher: divan::Bencher) {
    let secret = test_secret();
    let iv = Iv::generate().to_hex();
    let salt = Salt::generate().to_hex();
    bencher.bench(|| {
        derive_key(
            divan::black_box(&secret),
            divan::black_box(&iv),
            divan::black_box(&salt),
        )
    });
}

#[divan::bench(args = [64, 1024, 65536])]
fn bench_forward(bencher: divan::Bencher, size: usize) {
    let key = derive_key(&test_secret(), "iv", "salt");
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| cipher::forward(divan::black_box(&data), divan::black_box(&key)));
}

#[divan::bench]
fn bench_seal_open(bencher: divan::Bencher) {
    let secret = test_secret();
    let payload = r#"{"apiKey":"bench-api-key-1234567890","apiSecret":"bench-secret"}"#;
    bencher.bench(|| {
        let sealed = seal(divan::black_box(&secret), divan::black_box(payload)).unwrap();
        open(&secret, &sealed).unwrap()
    });
}

fn main() {
    divan::main();
}
