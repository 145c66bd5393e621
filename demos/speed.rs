use lanecrypt::aes::modes::Ctr;
use lanecrypt::chacha::{Lanes, State};
use lanecrypt::*;
use std::{hint::black_box, time::Instant};

const SIZE: usize = 256;
const BUF_LEN: usize = SIZE * MB;
const MB: usize = 1 << 20;

fn report(name: &str, width: impl std::fmt::Debug, start: Instant) {
    let t = Instant::now().duration_since(start).as_secs_f64();
    let delta = t / BUF_LEN as f64 * 1e9;
    let speed = (SIZE as f64 / 1024.0) / t;
    let width = format!("{width:?}");
    println!("{name:<10} {width:<12} {delta:.2} ns per byte, {speed:.2} GiB/s");
}

fn main() {
    let mut buf = vec![u8::MAX; BUF_LEN];
    getrandom::fill(&mut buf).unwrap();
    let mut key = [0; 32];
    getrandom::fill(&mut key).unwrap();
    let nonce = [0; 12];
    println!("detected {}", SimdWidth::detect());
    println!();

    for lanes in PolyLanes::ALL {
        let start = Instant::now();
        let mut mac = Poly1305::with_lanes(&key, lanes);
        mac.update(&buf);
        black_box(mac.finalize());
        report("poly1305", lanes, start);
    }
    println!();

    for width in SimdWidth::ALL {
        let start = Instant::now();
        let mut ghash = GHash::with_width(&[0x42; BLOCK_LEN], width);
        ghash.update(&buf);
        black_box(ghash.finalize());
        report("ghash", width, start);
    }
    println!();

    for lanes in AesLanes::ALL {
        let keys = RoundKeys::expand(&key).unwrap();
        let mut ctr = Ctr::with_lanes(keys, lanes, &[0; BLOCK_LEN]);
        let start = Instant::now();
        ctr.apply_keystream(&mut buf);
        report("aes-ctr", lanes, start);
    }
    println!();

    for width in SimdWidth::ALL {
        let keys = RoundKeys::expand(&key).unwrap();
        let mut gcm = AesGcm::with_width(keys, width);
        let start = Instant::now();
        black_box(gcm.seal_in_place(&nonce, &[], &mut buf).unwrap());
        report("aes-gcm", width, start);
    }
    println!();

    for lanes in Lanes::ALL {
        let mut chacha = ChaCha20::with_lanes(State::new(&key, &nonce, 0), lanes);
        let start = Instant::now();
        chacha.apply_keystream(&mut buf).unwrap();
        report("chacha20", lanes, start);
    }
    black_box(buf);
}
