#![no_std]
#![no_main]
#![feature(impl_trait_in_assoc_type)]

use embassy_futures::join::join;
use embassy_stm32::gpio;
use embassy_time::{Duration, Ticker};
#[allow(unused_imports)]
use panic_probe as _;
use pitlight::config::Tunables;
use pitlight::led_serializer;
use pitlight::pipeline::Pipeline;

#[cfg(feature = "log")]
use defmt_rtt as _;

#[embassy_executor::main]
async fn main(_spawner: embassy_executor::Spawner) -> ! {
    let p = embassy_stm32::init(config());
    let status_led = gpio::Output::new(p.PJ13, gpio::Level::High, gpio::Speed::Low);

    let mut pipeline = Pipeline::new(Tunables::DEFAULT);

    join(status_blink(status_led), foreground(&mut pipeline)).await.0
}

/// The foreground loop (§5): waits for `frame_ready`, runs stages C-F, and
/// hands the result to the LED serializer once it reports idle.
///
/// Capture (stage A) and the vsync handler (stage B) run from the
/// line-DMA-complete and vertical-sync interrupts respectively, wired to
/// `pipeline.on_line` / `pipeline.on_vsync` from the video-decoder's DCMI/DMA
/// peripheral - that peripheral binding is board-specific setup and is not
/// reproduced here.
async fn foreground(pipeline: &mut Pipeline) -> ! {
    let mut wire_buffer = [0u16; 24 * pitlight::consts::LEDS_MAX + led_serializer::RESET_GAP_BITS];

    loop {
        pipeline.frame_ready.wait().await;
        let leds = pipeline.run_foreground();

        pitlight::util::until(|| !pipeline.led_busy.is_busy()).await;
        let written = led_serializer::encode(&leds, &mut wire_buffer);
        pipeline.led_busy.mark_busy();
        // Arming the timer/DMA transfer of `wire_buffer[..written]` and
        // clearing `led_busy` on its completion interrupt is the LED
        // serializer peripheral's job (§4.8); out of scope here.
        let _ = written;
    }
}

async fn status_blink(led: gpio::Output<'_, impl gpio::Pin>) -> ! {
    let mut led = led;
    let mut ticker = Ticker::every(Duration::from_millis(500));
    loop {
        led.toggle();
        ticker.next().await;
    }
}

fn config() -> embassy_stm32::Config {
    use embassy_stm32::rcc::*;
    let mut config = embassy_stm32::Config::default();
    config.rcc = {
        let mut rcc = Config::default();
        rcc.hsi = true;
        rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV8,
            mul: PllMul(64),
            divp: Some(PllPDiv::DIV2),
            divq: None,
            divr: None,
        });
        rcc.pll_src = PllSource::HSI;
        rcc.sys = Sysclk::PLL1_P;
        rcc.apb1_pre = APBPrescaler::DIV2;
        rcc
    };
    config
}
